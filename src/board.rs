//! RP2040 wiring of the dashboard capabilities.
//!
//! Pinout:
//! - I2C0 (GPIO4 SDA, GPIO5 SCL): BME680 climate sensor
//! - I2C1 (GPIO2 SDA, GPIO3 SCL): SGP30 gas sensor
//! - SPI1 (GPIO10 SCK, GPIO11 MOSI, GPIO9 CS, GPIO8 DC, GPIO12 RST): ST7789 panel
//! - GPIO16: screen button, active low

use bme680::{Bme680, FieldData, I2CAddress, IIRFilterSize, OversamplingSetting, PowerMode, SettingsBuilder};
use rp_pico::hal::gpio::bank0::{Gpio2, Gpio3, Gpio4, Gpio5};
use rp_pico::hal::gpio::{FunctionI2C, Pin, PullUp};
use rp_pico::hal::{Timer, I2C};
use rp_pico::pac::{I2C0, I2C1};
use sgp30::{Baseline, Humidity, Sgp30};

use crate::calibration::{BaselineStorage, CalibrationBaseline, BASELINE_LEN};
use crate::error::{SensorError, StorageError};
use crate::sensors::{ClimateSensor, GasReading, GasSensor};

pub type ClimateBus = I2C<I2C0, (Pin<Gpio4, FunctionI2C, PullUp>, Pin<Gpio5, FunctionI2C, PullUp>)>;
pub type GasBus = I2C<I2C1, (Pin<Gpio2, FunctionI2C, PullUp>, Pin<Gpio3, FunctionI2C, PullUp>)>;

type Bme = Bme680<ClimateBus, Timer>;

/// SGP30 fixed bus address
pub const SGP30_ADDRESS: u8 = 0x58;

enum ClimateState {
    Idle(ClimateBus),
    Ready(Bme),
    Failed,
}

/// BME680 used as a plain temperature / humidity / pressure sensor.
///
/// `read_temperature` triggers a forced-mode measurement; humidity and
/// pressure come from that same measurement.
pub struct Bme680Climate {
    state: ClimateState,
    delay: Timer,
    last: Option<FieldData>,
}

impl Bme680Climate {
    pub fn new(bus: ClimateBus, delay: Timer) -> Self {
        Self {
            state: ClimateState::Idle(bus),
            delay,
            last: None,
        }
    }

    fn field(&self, read: impl Fn(&FieldData) -> f32) -> f32 {
        self.last.as_ref().map(read).unwrap_or(f32::NAN)
    }
}

impl ClimateSensor for Bme680Climate {
    type Error = SensorError;

    fn begin(&mut self, address: u8) -> Result<(), SensorError> {
        let address = match address {
            0x76 => I2CAddress::Primary,
            0x77 => I2CAddress::Secondary,
            _ => return Err(SensorError::NotFound),
        };

        let bus = match core::mem::replace(&mut self.state, ClimateState::Failed) {
            ClimateState::Idle(bus) => bus,
            ready @ ClimateState::Ready(_) => {
                self.state = ready;
                return Ok(());
            }
            ClimateState::Failed => return Err(SensorError::NotFound),
        };

        // The gas heater stays off, the SGP30 covers air quality
        let settings = SettingsBuilder::new()
            .with_humidity_oversampling(OversamplingSetting::OS2x)
            .with_pressure_oversampling(OversamplingSetting::OS4x)
            .with_temperature_oversampling(OversamplingSetting::OS8x)
            .with_temperature_filter(IIRFilterSize::Size3)
            .with_run_gas(false)
            .build();

        let mut bme = Bme680::init(bus, &mut self.delay, address).map_err(|_| SensorError::NotFound)?;
        bme.set_sensor_settings(&mut self.delay, settings)
            .map_err(|_| SensorError::Bus)?;
        self.state = ClimateState::Ready(bme);
        Ok(())
    }

    fn read_temperature(&mut self) -> f32 {
        self.last = match &mut self.state {
            ClimateState::Ready(bme) => bme
                .set_sensor_mode(&mut self.delay, PowerMode::ForcedMode)
                .ok()
                .and_then(|_| bme.get_sensor_data(&mut self.delay).ok())
                .map(|(data, _)| data),
            _ => None,
        };
        self.field(FieldData::temperature_celsius)
    }

    fn read_humidity(&mut self) -> f32 {
        self.field(FieldData::humidity_percent)
    }

    fn read_pressure(&mut self) -> f32 {
        self.field(|data| data.pressure_hpa() * 100.0)
    }
}

/// SGP30 eCO2 / TVOC sensor
pub struct Sgp30Gas {
    sgp: Sgp30<GasBus, Timer>,
    started: bool,
}

impl Sgp30Gas {
    pub fn new(bus: GasBus, delay: Timer) -> Self {
        Self {
            sgp: Sgp30::new(bus, SGP30_ADDRESS, delay),
            started: false,
        }
    }

    fn started(&self) -> Result<(), SensorError> {
        if self.started {
            Ok(())
        } else {
            Err(SensorError::NotInitialized)
        }
    }
}

impl GasSensor for Sgp30Gas {
    type Error = SensorError;

    fn begin(&mut self) -> Result<(), SensorError> {
        self.sgp.init().map_err(|_| SensorError::NotFound)?;
        self.started = true;
        Ok(())
    }

    fn set_humidity(&mut self, absolute_humidity: u32) -> Result<(), SensorError> {
        self.started()?;
        let humidity = Humidity::from_f32(absolute_humidity as f32 / 1000.0).map_err(|_| SensorError::Bus)?;
        self.sgp.set_humidity(Some(&humidity)).map_err(|_| SensorError::Bus)
    }

    fn set_iaq_baseline(&mut self, eco2: u16, tvoc: u16) -> Result<(), SensorError> {
        self.started()?;
        self.sgp
            .set_baseline(&Baseline { co2eq: eco2, tvoc })
            .map_err(|_| SensorError::Bus)
    }

    fn measure(&mut self) -> Result<GasReading, SensorError> {
        self.started()?;
        let measurement = self.sgp.measure().map_err(|_| SensorError::Bus)?;
        Ok(GasReading {
            eco2: measurement.co2eq_ppm,
            tvoc: measurement.tvoc_ppb,
        })
    }
}

const XIP_BASE: usize = 0x1000_0000;
const FLASH_SIZE: usize = 2 * 1024 * 1024;
const SECTOR_SIZE: usize = 4096;

/// Baseline artifact in the last flash sector, which `memory.x` keeps out of
/// the firmware image. Read through XIP; a record with an erased word means
/// no artifact.
/// Writing is left to the calibration tooling.
pub struct FlashStorage {
    offset: usize,
}

impl Default for FlashStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashStorage {
    pub fn new() -> Self {
        Self {
            offset: FLASH_SIZE - SECTOR_SIZE,
        }
    }
}

impl BaselineStorage for FlashStorage {
    type Error = StorageError;

    fn mount(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn format(&mut self) -> Result<(), StorageError> {
        Err(StorageError::ReadOnly)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StorageError> {
        let mut record = [0u8; BASELINE_LEN];
        for (i, byte) in record.iter_mut().enumerate() {
            // SAFETY: the sector lies inside the memory-mapped flash window and is never written at runtime
            *byte = unsafe { core::ptr::read_volatile((XIP_BASE + self.offset + i) as *const u8) };
        }

        if CalibrationBaseline::from_flash_record(&record).is_none() {
            return Ok(None);
        }
        let len = buf.len().min(BASELINE_LEN);
        buf[..len].copy_from_slice(&record[..len]);
        Ok(Some(len))
    }

    fn write(&mut self, _bytes: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::ReadOnly)
    }
}
