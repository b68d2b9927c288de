//! Error types for protosim_core.
//!
//! Configuration problems are reported at engine construction. Queries that
//! name a device the registry does not hold fail that query only; they never
//! poison the engine.

use protosim_data::DeviceId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Distribution that cannot place the requested population
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Device id not present in the population registry
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    #[must_use]
    pub fn invalid_distribution<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDistribution(msg.into())
    }

    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::InvalidDistribution(_) | Self::ConfigParse(_)
        )
    }
}

/// Returns an [`SimError::InvalidConfig`] from the enclosing function when the
/// condition does not hold.
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::SimError::invalid_config(format!($($arg)+)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::invalid_config("radius must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: radius must be positive"
        );
    }

    #[test]
    fn test_unknown_device_is_not_config_error() {
        let err = SimError::UnknownDevice(DeviceId(3));
        assert!(err.to_string().contains("device#3"));
        assert!(!err.is_config_error());
        assert!(SimError::invalid_distribution("empty volume").is_config_error());
    }
}
