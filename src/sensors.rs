use crate::metrics::{compensate_humidity, DerivedMetrics};

/// Pascal per millimetre of mercury
pub const PA_PER_MMHG: f32 = 133.322;

/// Temperature, humidity and pressure sensor.
///
/// A channel that failed its conversion reads as NaN.
pub trait ClimateSensor {
    type Error;

    /// Probes the sensor at `address` and configures it
    fn begin(&mut self, address: u8) -> Result<(), Self::Error>;

    /// Temperature in °C. Called first on every sample.
    fn read_temperature(&mut self) -> f32;

    /// Relative humidity in %
    fn read_humidity(&mut self) -> f32;

    /// Barometric pressure in Pa
    fn read_pressure(&mut self) -> f32;
}

/// Equivalent CO2 / TVOC sensor with an on-chip baseline algorithm.
pub trait GasSensor {
    type Error;

    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Feeds absolute humidity in mg/m³ to the on-chip compensation
    fn set_humidity(&mut self, absolute_humidity: u32) -> Result<(), Self::Error>;

    /// Restores the on-chip baseline words
    fn set_iaq_baseline(&mut self, eco2: u16, tvoc: u16) -> Result<(), Self::Error>;

    /// Runs one measurement cycle
    fn measure(&mut self) -> Result<GasReading, Self::Error>;
}

/// Physical readings of the climate sensor. Any channel may be NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawReading {
    /// °C
    pub temperature: f32,
    /// %
    pub humidity: f32,
    /// mmHg
    pub pressure: f32,
}

impl Default for RawReading {
    fn default() -> Self {
        Self {
            temperature: f32::NAN,
            humidity: f32::NAN,
            pressure: f32::NAN,
        }
    }
}

/// Output of one successful gas measurement cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasReading {
    /// ppm
    pub eco2: u16,
    /// ppb
    pub tvoc: u16,
}

/// Last gas reading held across failed cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeldGas {
    pub reading: GasReading,
    /// Set when the latest cycle failed, or before the first success
    pub stale: bool,
}

impl Default for HeldGas {
    fn default() -> Self {
        Self {
            reading: GasReading::default(),
            stale: true,
        }
    }
}

/// Everything one sample produced
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub climate: RawReading,
    pub gas: HeldGas,
    pub metrics: DerivedMetrics,
}

/// Turns driver readings into corrected readings and derived metrics
pub struct MetricEngine<C, G> {
    climate: C,
    gas: G,
}

impl<C, G> MetricEngine<C, G>
where
    C: ClimateSensor,
    G: GasSensor,
{
    pub fn new(climate: C, gas: G) -> Self {
        Self { climate, gas }
    }

    /// Gets data from the climate sensor, converting pressure to mmHg.
    /// NaN channels are passed through untouched.
    pub fn read_climate(&mut self) -> RawReading {
        let temperature = self.climate.read_temperature();
        let humidity = self.climate.read_humidity();
        let pressure = self.climate.read_pressure() / PA_PER_MMHG;
        RawReading {
            temperature,
            humidity,
            pressure,
        }
    }

    /// Runs one gas measurement cycle
    /// returns None if the cycle failed; the caller keeps its last reading
    pub fn read_gas(&mut self) -> Option<GasReading> {
        match self.gas.measure() {
            Ok(reading) => Some(reading),
            Err(_) => {
                warn!("Gas measurement cycle failed");
                None
            }
        }
    }

    /// Takes a full sample: climate, humidity compensation, gas, metrics
    /// param held: the previous snapshot, whose gas reading survives a failed cycle
    /// returns the new snapshot
    pub fn sample(&mut self, held: &Snapshot) -> Snapshot {
        let climate = self.read_climate();

        match compensate_humidity(climate.temperature, climate.humidity) {
            Some(absolute) => {
                if self.gas.set_humidity(absolute.fixed_point()).is_err() {
                    warn!("Gas sensor rejected humidity compensation");
                }
            }
            None => warn!("Climate reading incomplete, humidity compensation skipped"),
        }

        let gas = match self.read_gas() {
            Some(reading) => HeldGas {
                reading,
                stale: false,
            },
            None => HeldGas {
                stale: true,
                ..held.gas
            },
        };

        let metrics = DerivedMetrics::from_gas(gas.reading.eco2, gas.reading.tvoc);
        debug!(
            "Sample: {} C, {} %, {} mmHg, eCO2 {} ppm, TVOC {} ppb, IAQ {}",
            climate.temperature,
            climate.humidity,
            climate.pressure,
            gas.reading.eco2,
            gas.reading.tvoc,
            metrics.air_quality_index
        );

        Snapshot {
            climate,
            gas,
            metrics,
        }
    }

    pub fn climate_mut(&mut self) -> &mut C {
        &mut self.climate
    }

    pub fn gas_mut(&mut self) -> &mut G {
        &mut self.gas
    }
}
