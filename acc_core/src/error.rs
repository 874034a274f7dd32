//! Error type shared by every crate in the workspace.
//!
//! The control loop has no recoverable failures: any sensor or actuator
//! error aborts the loop and is reported once by the caller.

use thiserror::Error;

/// Result alias used throughout the workspace
pub type AccResult<T> = Result<T, AccError>;

#[derive(Debug, Error)]
pub enum AccError {
    /// An analog or distance read failed or timed out
    #[error("sensor read failed on {source_name}: {reason}")]
    SensorReadFailure { source_name: String, reason: String },

    /// A digital or PWM write could not be delivered
    #[error("actuator write failed on {target}: {reason}")]
    ActuatorWriteFailure { target: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// Serial transport or board handshake failure
    #[error("communication error: {0}")]
    Communication(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AccError {
    pub fn config(msg: impl Into<String>) -> Self {
        AccError::Config(msg.into())
    }

    pub fn sensor(source_name: impl ToString, reason: impl ToString) -> Self {
        AccError::SensorReadFailure {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn actuator(target: impl ToString, reason: impl ToString) -> Self {
        AccError::ActuatorWriteFailure {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for the two failure kinds raised at the hardware boundary
    pub fn is_hardware_failure(&self) -> bool {
        matches!(
            self,
            AccError::SensorReadFailure { .. } | AccError::ActuatorWriteFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_failure_display() {
        let err = AccError::sensor("A2", "no sample within 1000ms");
        assert_eq!(
            err.to_string(),
            "sensor read failed on A2: no sample within 1000ms"
        );
        assert!(err.is_hardware_failure());

        let err = AccError::actuator("D9", "broken pipe");
        assert!(err.is_hardware_failure());
        assert!(!AccError::config("bad").is_hardware_failure());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "late");
        let err: AccError = io.into();
        assert!(matches!(err, AccError::Io(_)));
    }
}
