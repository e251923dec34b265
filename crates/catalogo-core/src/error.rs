use thiserror::Error;

/// Validation failures raised by the domain types. All of them are client errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{field} {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Invalid ID: {0}")]
    InvalidId(String),
}

impl CoreError {
    /// Create a new InvalidField error
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
