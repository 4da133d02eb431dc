use thiserror::Error;

/// Invalid pruning strategy or configuration values.
///
/// Raised by validation before any collection is touched or any live
/// configuration is replaced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid schedule: '{0}'")]
    InvalidSchedule(String),
}

impl ConfigurationError {
    /// Field name the error refers to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigurationError::NotFinite { field, .. }
            | ConfigurationError::Negative { field, .. }
            | ConfigurationError::OutOfUnitRange { field, .. }
            | ConfigurationError::Zero { field } => Some(field),
            ConfigurationError::InvalidSchedule(_) => None,
        }
    }
}

/// Reject NaN/infinite and negative values.
pub fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ConfigurationError::Negative { field, value });
    }
    Ok(())
}

/// Reject anything outside the closed unit interval.
pub fn ensure_unit_range(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NotFinite { field, value });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::OutOfUnitRange { field, value });
    }
    Ok(())
}
