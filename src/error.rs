use thiserror_no_std::Error;

/// Failures of a baseline storage back-end.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    #[error("storage is not mounted")]
    NotMounted,
    #[error("storage is read-only")]
    ReadOnly,
    #[error("artifact does not fit in storage")]
    CapacityExceeded,
}

/// Failures of a sensor adapter.
///
/// Adapters collapse their bus-specific errors into this so the control loop
/// only has to log them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    #[error("sensor has not been started")]
    NotInitialized,
    #[error("sensor did not answer at the configured address")]
    NotFound,
    #[error("bus transfer failed")]
    Bus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String;

    #[test]
    fn errors_render_a_message() {
        let mut out: String<48> = String::new();
        write!(out, "{}", StorageError::ReadOnly).unwrap();
        assert_eq!(out.as_str(), "storage is read-only");

        out.clear();
        write!(out, "{}", SensorError::NotFound).unwrap();
        assert!(out.starts_with("sensor did not answer"));
    }
}
