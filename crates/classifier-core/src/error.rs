//! Error types for the classifier trainer workspace.

use thiserror::Error;

/// Main error type for trainer operations.
#[derive(Error, Debug)]
pub enum TrainerError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Configuration error (missing directory, invalid option value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset error (empty or malformed data directory)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// No preprocessing function registered for the selected architecture
    #[error("Preprocessing error: {0}")]
    Preprocess(String),

    /// Model assembly or framework error
    #[error("Model error: {0}")]
    Model(String),
}

impl From<image::ImageError> for TrainerError {
    fn from(err: image::ImageError) -> Self {
        TrainerError::Image(err.to_string())
    }
}

/// Specialized Result type for trainer operations.
pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrainerError::Config("validation directory not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: validation directory not set"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TrainerError = io_err.into();
        assert!(matches!(err, TrainerError::Io(_)));
    }

    #[test]
    fn test_result_type() {
        let success: Result<i32> = Ok(42);
        assert!(success.is_ok());

        let failure: Result<i32> = Err(TrainerError::Model("test".to_string()));
        assert!(failure.is_err());
    }
}
