use thiserror::Error;

/// Validation failures for caller-constructed values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("query text must not be empty")]
    EmptyQuery,

    #[error("request id must be at least 8 characters")]
    InvalidRequestId,

    #[error("schema version '{value}' is not of the form vMAJOR.MINOR.PATCH")]
    InvalidSchemaVersion { value: String },

    #[error("source chain must not be empty")]
    EmptySourceChain,

    #[error("error code must not be empty")]
    EmptyErrorCode,

    #[error("error message must not be empty")]
    EmptyErrorMessage,

    #[error("unknown source '{value}'")]
    InvalidSource { value: String },

    #[error("timestamp formatting failed")]
    Timestamp(#[from] time::error::Format),
}
