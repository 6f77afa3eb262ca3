use crate::timer::Cadence;

/// Default climate sensor address on the I2C bus
pub const CLIMATE_ADDRESS: u8 = 0x76;
/// How often the clock field is refreshed
pub const CLOCK_INTERVAL_MS: u32 = 30_000;
/// Sensor cadence of the full dashboard
pub const SENSOR_INTERVAL_MS: u32 = 5_000;
/// Sensor cadence of the minimal dashboard
pub const MINIMAL_SENSOR_INTERVAL_MS: u32 = 10_000;

/// Preferences defines the tunables of the dashboard.
/// sensor_interval_ms: Minimum time between two sensor samples
/// clock_interval_ms: Minimum time between two clock refreshes
/// climate_address: I2C address handed to the climate sensor on boot
/// utc_offset_secs: Local time zone offset from UTC
/// daylight_offset_secs: Extra offset while daylight saving is active
/// format_storage_if_failed: Whether an unmountable baseline storage gets formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preferences {
    pub sensor_interval_ms: u32,
    pub clock_interval_ms: u32,
    pub climate_address: u8,
    pub utc_offset_secs: i32,
    pub daylight_offset_secs: i32,
    pub format_storage_if_failed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            sensor_interval_ms: SENSOR_INTERVAL_MS,
            clock_interval_ms: CLOCK_INTERVAL_MS,
            climate_address: CLIMATE_ADDRESS,
            utc_offset_secs: 7200, // GMT+2
            daylight_offset_secs: 0,
            format_storage_if_failed: true,
        }
    }
}

impl Preferences {
    /// Preferences of the minimal dashboard, which samples half as often
    pub fn minimal() -> Self {
        Preferences {
            sensor_interval_ms: MINIMAL_SENSOR_INTERVAL_MS,
            ..Self::default()
        }
    }

    /// Gets the scheduler cadence for these preferences
    pub fn cadence(&self) -> Cadence {
        Cadence {
            clock_interval_ms: self.clock_interval_ms,
            sensor_interval_ms: self.sensor_interval_ms,
        }
    }

    /// Total offset of local time from UTC, daylight saving included
    pub fn local_offset_secs(&self) -> i32 {
        self.utc_offset_secs + self.daylight_offset_secs
    }
}
