//! Error types for the bpelab libraries.

use thiserror::Error;

/// Main error type for the bpelab libraries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    /// A replay step outside `[0, max]`
    #[error("Step {step} is out of range (valid steps are 0..={max})")]
    StepOutOfRange { step: usize, max: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown algorithm name
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Unknown token string
    #[error("Unknown token: {0}")]
    UnknownToken(String),
}

impl TokenizerError {
    /// Check `step` against the inclusive upper bound `max`.
    pub fn check_step(step: usize, max: usize) -> Result<()> {
        if step > max {
            return Err(TokenizerError::StepOutOfRange { step, max });
        }
        Ok(())
    }
}

/// Result type alias for bpelab operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_step() {
        assert!(TokenizerError::check_step(0, 0).is_ok());
        assert!(TokenizerError::check_step(3, 3).is_ok());
        assert_eq!(
            TokenizerError::check_step(4, 3),
            Err(TokenizerError::StepOutOfRange { step: 4, max: 3 })
        );
    }

    #[test]
    fn test_display() {
        let err = TokenizerError::StepOutOfRange { step: 9, max: 2 };
        assert_eq!(
            err.to_string(),
            "Step 9 is out of range (valid steps are 0..=2)"
        );
    }
}
