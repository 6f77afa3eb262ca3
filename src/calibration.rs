//! Gas sensor baseline persistence.
//!
//! The baseline artifact is exactly four bytes: the eCO2 word followed by the
//! TVOC word, each little-endian. Anything shorter reads as "no calibration".

use heapless::Vec;

use crate::error::StorageError;
use crate::sensors::GasSensor;

/// Size of the baseline artifact in bytes
pub const BASELINE_LEN: usize = 4;

/// Content of a never-programmed flash word
pub const ERASED_WORD: u16 = 0xFFFF;

/// The two on-chip baseline words of the gas sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationBaseline {
    pub eco2: u16,
    pub tvoc: u16,
}

impl CalibrationBaseline {
    pub fn to_bytes(&self) -> [u8; BASELINE_LEN] {
        let eco2 = self.eco2.to_le_bytes();
        let tvoc = self.tvoc.to_le_bytes();
        [eco2[0], eco2[1], tvoc[0], tvoc[1]]
    }

    /// Decodes the artifact; short input is rejected, extra bytes are ignored
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [e0, e1, t0, t1, ..] => Some(Self {
                eco2: u16::from_le_bytes([*e0, *e1]),
                tvoc: u16::from_le_bytes([*t0, *t1]),
            }),
            _ => None,
        }
    }

    /// Decodes a record read straight from flash. A record with an erased
    /// word was never completely programmed and counts as absent.
    pub fn from_flash_record(record: &[u8; BASELINE_LEN]) -> Option<Self> {
        Self::from_bytes(record).filter(|b| b.eco2 != ERASED_WORD && b.tvoc != ERASED_WORD)
    }
}

/// Durable home of the baseline artifact
pub trait BaselineStorage {
    type Error;

    fn mount(&mut self) -> Result<(), Self::Error>;

    /// Erases everything and leaves the storage unmounted
    fn format(&mut self) -> Result<(), Self::Error>;

    /// Reads the artifact into `buf`
    /// returns the number of bytes read, or None if there is no artifact
    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// Replaces the artifact
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Mounts the storage, formatting it once if mounting fails and `format_if_failed` is set
/// returns whether the storage ended up mounted
pub fn init_storage<S: BaselineStorage>(storage: &mut S, format_if_failed: bool) -> bool {
    if storage.mount().is_ok() {
        info!("Baseline storage mounted");
        return true;
    }

    if !format_if_failed {
        error!("Baseline storage mount failed");
        return false;
    }

    warn!("Baseline storage mount failed, formatting");
    if storage.format().is_ok() && storage.mount().is_ok() {
        info!("Baseline storage formatted");
        true
    } else {
        error!("Baseline storage format failed");
        false
    }
}

/// Reads and writes the baseline artifact on a storage back-end
pub struct CalibrationStore<S> {
    storage: S,
}

impl<S: BaselineStorage> CalibrationStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Loads the stored baseline
    /// returns None when the artifact is missing, truncated or unreadable
    pub fn load(&mut self) -> Option<CalibrationBaseline> {
        let mut buf = [0u8; BASELINE_LEN];
        match self.storage.read(&mut buf) {
            Ok(Some(len)) => {
                let baseline = CalibrationBaseline::from_bytes(&buf[..len.min(BASELINE_LEN)]);
                if baseline.is_none() {
                    warn!("Baseline artifact truncated to {} bytes", len);
                }
                baseline
            }
            Ok(None) => None,
            Err(_) => {
                warn!("Baseline artifact unreadable");
                None
            }
        }
    }

    pub fn save(&mut self, baseline: &CalibrationBaseline) -> Result<(), S::Error> {
        self.storage.write(&baseline.to_bytes())
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}

/// Pushes a baseline into the gas sensor
/// returns whether the sensor accepted it
pub fn apply<G: GasSensor>(baseline: &CalibrationBaseline, gas: &mut G) -> bool {
    match gas.set_iaq_baseline(baseline.eco2, baseline.tvoc) {
        Ok(()) => {
            info!("Gas baseline restored: eCO2 {}, TVOC {}", baseline.eco2, baseline.tvoc);
            true
        }
        Err(_) => {
            warn!("Gas sensor rejected the stored baseline");
            false
        }
    }
}

/// Baseline storage kept in RAM, for tests and boards without a file system
#[derive(Debug, Default)]
pub struct RamStorage<const N: usize> {
    artifact: Option<Vec<u8, N>>,
    mounted: bool,
    corrupt: bool,
}

impl<const N: usize> RamStorage<N> {
    pub fn new() -> Self {
        Self {
            artifact: None,
            mounted: false,
            corrupt: false,
        }
    }

    /// Storage that already holds `bytes`, as if written in a previous power cycle
    pub fn with_artifact(bytes: &[u8]) -> Result<Self, StorageError> {
        let artifact = Vec::from_slice(bytes).map_err(|_| StorageError::CapacityExceeded)?;
        Ok(Self {
            artifact: Some(artifact),
            ..Self::new()
        })
    }

    /// Storage whose file system is damaged; it mounts only after a format
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new()
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn artifact(&self) -> Option<&[u8]> {
        self.artifact.as_deref()
    }
}

impl<const N: usize> BaselineStorage for RamStorage<N> {
    type Error = StorageError;

    fn mount(&mut self) -> Result<(), StorageError> {
        if self.corrupt {
            return Err(StorageError::NotMounted);
        }
        self.mounted = true;
        Ok(())
    }

    fn format(&mut self) -> Result<(), StorageError> {
        self.artifact = None;
        self.corrupt = false;
        self.mounted = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        Ok(self.artifact.as_ref().map(|artifact| {
            let len = artifact.len().min(buf.len());
            buf[..len].copy_from_slice(&artifact[..len]);
            len
        }))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        let artifact = Vec::from_slice(bytes).map_err(|_| StorageError::CapacityExceeded)?;
        self.artifact = Some(artifact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted(mut storage: RamStorage<16>) -> CalibrationStore<RamStorage<16>> {
        assert!(init_storage(&mut storage, false));
        CalibrationStore::new(storage)
    }

    #[test]
    fn byte_layout_is_eco2_then_tvoc_little_endian() {
        let baseline = CalibrationBaseline {
            eco2: 0x8F12,
            tvoc: 0x0034,
        };
        assert_eq!(baseline.to_bytes(), [0x12, 0x8F, 0x34, 0x00]);
    }

    #[test]
    fn round_trip() {
        let mut store = mounted(RamStorage::new());
        let baseline = CalibrationBaseline { eco2: 400, tvoc: 0 };

        store.save(&baseline).unwrap();
        assert_eq!(store.storage_mut().artifact().map(|a| a.len()), Some(4));
        assert_eq!(store.load(), Some(baseline));
    }

    #[test]
    fn missing_artifact_is_uncalibrated() {
        let mut store = mounted(RamStorage::new());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn truncated_artifact_is_uncalibrated() {
        let mut store = mounted(RamStorage::with_artifact(&[0x90, 0x01]).unwrap());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn unmounted_storage_is_uncalibrated() {
        let mut store = CalibrationStore::new(RamStorage::<16>::with_artifact(&[1, 2, 3, 4]).unwrap());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_storage_is_formatted_when_allowed() {
        let mut storage = RamStorage::<16>::corrupt();
        assert!(!init_storage(&mut storage, false));
        assert!(!storage.is_mounted());

        assert!(init_storage(&mut storage, true));
        assert!(storage.is_mounted());
        assert_eq!(storage.artifact(), None);
    }

    #[test]
    fn erased_flash_record_is_absent() {
        assert_eq!(CalibrationBaseline::from_flash_record(&[0xFF; BASELINE_LEN]), None);
    }

    #[test]
    fn half_programmed_flash_record_is_absent() {
        assert_eq!(CalibrationBaseline::from_flash_record(&[0x3A, 0x8F, 0xFF, 0xFF]), None);
        assert_eq!(CalibrationBaseline::from_flash_record(&[0xFF, 0xFF, 0x12, 0x90]), None);
    }

    #[test]
    fn programmed_flash_record_decodes() {
        assert_eq!(
            CalibrationBaseline::from_flash_record(&[0x3A, 0x8F, 0x12, 0x90]),
            Some(CalibrationBaseline {
                eco2: 0x8F3A,
                tvoc: 0x9012,
            })
        );
    }

    #[test]
    fn oversized_write_is_rejected() {
        let mut storage = RamStorage::<2>::new();
        storage.mount().unwrap();
        assert_eq!(storage.write(&[0; 4]), Err(StorageError::CapacityExceeded));
    }
}
