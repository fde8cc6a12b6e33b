use thiserror::Error;

/// Errors surfaced by the sizing, wiring and interchange entry points.
///
/// Physical edge cases (zero speed, depleted battery, extreme temperature)
/// are never reported here; the component models clamp them instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed time-series row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type SimResult<T> = std::result::Result<T, SimError>;

impl SimError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SimError::InvalidInput(message.into())
    }
}

impl From<validator::ValidationErrors> for SimError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SimError::InvalidInput(errors.to_string())
    }
}

/// Rejects zero, negative and non-finite values for a named quantity.
pub(crate) fn require_positive(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidInput(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive() {
        assert!(require_positive("current", 1.0).is_ok());
        assert!(require_positive("current", 0.0).is_err());
        assert!(require_positive("current", -3.0).is_err());
        assert!(require_positive("current", f64::NAN).is_err());
        assert!(require_positive("current", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let error = SimError::invalid("rider weight must be positive");
        assert_eq!(error.to_string(), "Invalid input: rider weight must be positive");

        let error = SimError::MalformedRow {
            line: 4,
            reason: "bad float".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed time-series row at line 4: bad float"
        );
    }
}
