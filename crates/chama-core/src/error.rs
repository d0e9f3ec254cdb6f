use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChamaError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ChamaError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ChamaError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ChamaError {
    fn from(e: serde_json::Error) -> Self {
        ChamaError::SerializationError(e.to_string())
    }
}
