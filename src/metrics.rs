//! Derived air-quality metrics.
//!
//! The air-quality index blends two sub-indices on a 0..=500 scale:
//! - TVOC: 0 ppb maps to 0, 5000 ppb and above to 500
//! - eCO2: 400 ppm (outdoor air) maps to 0, 2000 ppm and above to 500
//!
//! TVOC carries 70% of the weight, eCO2 the remaining 30%.

/// Upper bound of the air-quality index
pub const AQI_MAX: f32 = 500.0;

const TVOC_FULL_SCALE_PPB: f32 = 5000.0;
const ECO2_CLEAN_PPM: f32 = 400.0;
const ECO2_FULL_SCALE_PPM: f32 = 2000.0;

// Weights in tenths so integral sub-indices blend without rounding
const TVOC_WEIGHT: f32 = 7.0;
const ECO2_WEIGHT: f32 = 3.0;

/// Computes the air-quality index
/// param eco2: equivalent CO2 in ppm
/// param tvoc: total volatile organic compounds in ppb
/// returns the index, always within 0..=500
pub fn compute_aqi(eco2: f32, tvoc: f32) -> f32 {
    let tvoc_sub = sub_index(tvoc * AQI_MAX / TVOC_FULL_SCALE_PPB);
    let eco2_sub =
        sub_index((eco2 - ECO2_CLEAN_PPM) * AQI_MAX / (ECO2_FULL_SCALE_PPM - ECO2_CLEAN_PPM));

    ((TVOC_WEIGHT * tvoc_sub + ECO2_WEIGHT * eco2_sub) / 10.0).clamp(0.0, AQI_MAX)
}

/// Clamps a sub-index to the index scale; NaN contributes nothing
fn sub_index(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, AQI_MAX)
    }
}

/// Qualitative band of an air-quality index. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AqiBand {
    Good,
    Fair,
    Moderate,
    Poor,
    Severe,
}

impl AqiBand {
    pub fn from_index(aqi: f32) -> Self {
        if aqi <= 30.0 {
            AqiBand::Good
        } else if aqi <= 50.0 {
            AqiBand::Fair
        } else if aqi <= 80.0 {
            AqiBand::Moderate
        } else if aqi <= 120.0 {
            AqiBand::Poor
        } else {
            AqiBand::Severe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiBand::Good => "good",
            AqiBand::Fair => "fair",
            AqiBand::Moderate => "moderate",
            AqiBand::Poor => "poor",
            AqiBand::Severe => "severe",
        }
    }
}

/// Metrics derived from the latest gas reading
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DerivedMetrics {
    pub air_quality_index: f32,
}

impl DerivedMetrics {
    pub fn from_gas(eco2: u16, tvoc: u16) -> Self {
        Self {
            air_quality_index: compute_aqi(eco2 as f32, tvoc as f32),
        }
    }

    pub fn band(&self) -> AqiBand {
        AqiBand::from_index(self.air_quality_index)
    }
}

/// Absolute humidity, used to compensate the gas sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AbsoluteHumidity(f32);

impl AbsoluteHumidity {
    /// Grams of water vapour per cubic metre
    pub fn grams_per_m3(&self) -> f32 {
        self.0
    }

    /// Fixed-point form expected by the gas sensor driver (mg/m³)
    pub fn fixed_point(&self) -> u32 {
        // `as` saturates, so sub-zero garbage lands on 0
        (self.0 * 1000.0) as u32
    }
}

/// Converts temperature and relative humidity into absolute humidity using the
/// Magnus approximation of the saturation vapour pressure.
/// param temperature: °C
/// param humidity: relative humidity in %
/// returns None if either input is NaN, so compensation is skipped
pub fn compensate_humidity(temperature: f32, humidity: f32) -> Option<AbsoluteHumidity> {
    if temperature.is_nan() || humidity.is_nan() {
        return None;
    }

    let saturation_hpa = 6.112 * libm::expf((17.62 * temperature) / (243.12 + temperature));
    let vapour_hpa = (humidity / 100.0) * saturation_hpa;
    Some(AbsoluteHumidity(216.7 * (vapour_hpa / (273.15 + temperature))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn aqi_endpoints() {
        assert_eq!(compute_aqi(400.0, 0.0), 0.0);
        assert_eq!(compute_aqi(2000.0, 5000.0), 500.0);
    }

    #[test]
    fn aqi_clamps_out_of_range_inputs() {
        assert_eq!(compute_aqi(0.0, 0.0), 0.0);
        assert_eq!(compute_aqi(60_000.0, 60_000.0), 500.0);
        assert_eq!(compute_aqi(400.0, 10_000.0), 350.0);
        assert_eq!(compute_aqi(10_000.0, 0.0), 150.0);
    }

    #[test]
    fn aqi_weighs_tvoc_heavier() {
        // 50% of each scale
        let tvoc_only = compute_aqi(400.0, 2500.0);
        let eco2_only = compute_aqi(1200.0, 0.0);
        assert_eq!(tvoc_only, 175.0);
        assert_eq!(eco2_only, 75.0);
    }

    #[test]
    fn clean_air_is_good() {
        assert_eq!(AqiBand::from_index(compute_aqi(400.0, 0.0)), AqiBand::Good);
        assert_eq!(DerivedMetrics::from_gas(400, 0).band().label(), "good");
    }

    #[test]
    fn band_boundaries_are_inclusive() {
        // eCO2 only: 320 ppm above clean air is a sub-index of 100, 30% of it is 30
        let at_30 = compute_aqi(720.0, 0.0);
        assert_eq!(at_30, 30.0);
        assert_eq!(AqiBand::from_index(at_30), AqiBand::Good);

        // Both sub-indices at 50
        let at_50 = compute_aqi(560.0, 500.0);
        assert_eq!(at_50, 50.0);
        assert_eq!(AqiBand::from_index(at_50), AqiBand::Fair);

        let at_80 = compute_aqi(656.0, 800.0);
        assert_eq!(at_80, 80.0);
        assert_eq!(AqiBand::from_index(at_80), AqiBand::Moderate);

        let at_120 = compute_aqi(784.0, 1200.0);
        assert_eq!(at_120, 120.0);
        assert_eq!(AqiBand::from_index(at_120), AqiBand::Poor);

        assert_eq!(AqiBand::from_index(120.01), AqiBand::Severe);
        assert_eq!(AqiBand::from_index(30.01), AqiBand::Fair);
    }

    #[test]
    fn humidity_compensation_matches_reference_point() {
        // 25 °C at 50% RH holds roughly 11.5 g/m³
        let absolute = compensate_humidity(25.0, 50.0).unwrap();
        assert!((absolute.grams_per_m3() - 11.5).abs() < 0.1);
        assert!((11_400..11_600).contains(&absolute.fixed_point()));
    }

    #[test]
    fn dry_air_holds_no_water() {
        let absolute = compensate_humidity(20.0, 0.0).unwrap();
        assert_eq!(absolute.fixed_point(), 0);
    }

    proptest! {
        #[test]
        fn aqi_stays_in_range(eco2 in proptest::num::f32::ANY, tvoc in proptest::num::f32::ANY) {
            let aqi = compute_aqi(eco2, tvoc);
            prop_assert!((0.0..=AQI_MAX).contains(&aqi));
        }

        #[test]
        fn nan_skips_compensation(value in -40.0f32..85.0) {
            prop_assert!(compensate_humidity(f32::NAN, value).is_none());
            prop_assert!(compensate_humidity(value, f32::NAN).is_none());
        }

        #[test]
        fn real_inputs_compensate(temperature in -40.0f32..85.0, humidity in 0.0f32..=100.0) {
            let absolute = compensate_humidity(temperature, humidity);
            prop_assert!(absolute.is_some());
            prop_assert!(absolute.unwrap().grams_per_m3() >= 0.0);
        }
    }
}
