//! Error types for the diffusion backbones library

use thiserror::Error;

use crate::model::BackboneKind;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// A tensor does not fit the dimensions the model was built with
    #[error("Shape mismatch for {tensor}: expected {expected}, got {actual:?}")]
    Shape {
        tensor: &'static str,
        expected: String,
        actual: Vec<i64>,
    },

    /// Conditional model called without a conditioning tensor
    #[error("{0} requires a conditioning tensor")]
    MissingConditioning(BackboneKind),

    /// Unconditional model called with a conditioning tensor
    #[error("{0} does not accept a conditioning tensor")]
    UnexpectedConditioning(BackboneKind),

    /// Invalid hyperparameters or configuration values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model kind that has no layers yet
    #[error("Backbone not implemented: {0}")]
    Unimplemented(BackboneKind),

    /// Error raised by libtorch
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn shape(
        tensor: &'static str,
        expected: impl Into<String>,
        actual: Vec<i64>,
    ) -> Self {
        Error::Shape {
            tensor,
            expected: expected.into(),
            actual,
        }
    }

    /// Whether the error comes from the caller's tensors rather than the model
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::Shape { .. } | Error::MissingConditioning(_) | Error::UnexpectedConditioning(_)
        )
    }
}

/// Check that every named hyperparameter is at least one.
pub(crate) fn ensure_positive(dims: &[(&str, i64)]) -> Result<()> {
    for (name, value) in dims {
        if *value < 1 {
            return Err(Error::InvalidConfig(format!(
                "{} must be at least 1, got {}",
                name, value
            )));
        }
    }
    Ok(())
}
