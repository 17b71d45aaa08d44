use thiserror::Error;

/// Main error type for the SACCJADE system
#[derive(Error, Debug)]
pub enum SaccError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Surrogate error: {0}")]
    Surrogate(#[from] SurrogateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Surrogate-model errors
///
/// These are recoverable: the optimizer answers any of them by falling back to
/// a true fitness evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurrogateError {
    #[error("Insufficient data: model needs {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Singular system: {message}")]
    Singular { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type alias for SACCJADE operations
pub type SaccResult<T> = Result<T, SaccError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::SaccError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::SaccError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SaccError::Config(format!($($arg)*))
    };
}
