//! Error types for Paddock

use thiserror::Error;

use crate::container::RuntimeError;

#[derive(Error, Debug)]
pub enum PaddockError {
    #[error("[INVALID_QUERY] Unable to parse query: {0}")]
    InvalidQuery(String),

    #[error("[TABLE_OR_VIEW_ALREADY_EXISTS] Cannot create table or view {0} because it already exists.")]
    TableAlreadyExists(String),

    #[error("[TABLE_OR_VIEW_NOT_FOUND] The table or view {0} cannot be found.")]
    TableNotFound(String),

    #[error("[NO_MATCHING_ROW] No matching row found for {key} = '{value}'")]
    NoMatchingRow { key: String, value: String },

    #[error("[INVALID_COLUMN] Column {column} of table {table} is not a CONTAINER column")]
    InvalidColumn { table: String, column: String },

    #[error("[MALFORMED_FUNCTION_CALL] Invalid input format: {0}")]
    MalformedFunctionCall(String),

    #[error("[INSUFFICIENT_ARGUMENTS] Insufficient parameters in input: {0}")]
    InsufficientArguments(String),

    #[error("[UNKNOWN_FUNCTION] Unsupported function: {0}")]
    UnknownFunction(String),

    #[error("[UNKNOWN_COLUMN_TYPE] Unsupported column type: {0}")]
    UnknownColumnType(String),

    #[error("[DUPLICATE_COLUMN] Column {0} is declared more than once")]
    DuplicateColumn(String),

    /// Reserved for callers that drive handles through
    /// `ContainerHandle::try_perform` and want adapter failures as errors.
    /// Queries never raise it: handles render adapter failures in place.
    #[error("[EXTERNAL_OPERATION_FAILED] {0}")]
    ExternalOperationFailed(String),

    #[error("[CONFIG_ERROR] {0}")]
    Config(String),

    #[error("[IO_ERROR] {0}")]
    Io(#[from] std::io::Error),

    #[error("[JSON_ERROR] {0}")]
    Json(#[from] serde_json::Error),
}

impl PaddockError {
    /// The bare error code, without brackets
    pub fn code(&self) -> &'static str {
        match self {
            PaddockError::InvalidQuery(_) => "INVALID_QUERY",
            PaddockError::TableAlreadyExists(_) => "TABLE_OR_VIEW_ALREADY_EXISTS",
            PaddockError::TableNotFound(_) => "TABLE_OR_VIEW_NOT_FOUND",
            PaddockError::NoMatchingRow { .. } => "NO_MATCHING_ROW",
            PaddockError::InvalidColumn { .. } => "INVALID_COLUMN",
            PaddockError::MalformedFunctionCall(_) => "MALFORMED_FUNCTION_CALL",
            PaddockError::InsufficientArguments(_) => "INSUFFICIENT_ARGUMENTS",
            PaddockError::UnknownFunction(_) => "UNKNOWN_FUNCTION",
            PaddockError::UnknownColumnType(_) => "UNKNOWN_COLUMN_TYPE",
            PaddockError::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            PaddockError::ExternalOperationFailed(_) => "EXTERNAL_OPERATION_FAILED",
            PaddockError::Config(_) => "CONFIG_ERROR",
            PaddockError::Io(_) => "IO_ERROR",
            PaddockError::Json(_) => "JSON_ERROR",
        }
    }
}

impl From<RuntimeError> for PaddockError {
    fn from(err: RuntimeError) -> Self {
        PaddockError::ExternalOperationFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PaddockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_bracketed_code() {
        let err = PaddockError::TableNotFound("fleet".to_string());
        assert_eq!(
            err.to_string(),
            "[TABLE_OR_VIEW_NOT_FOUND] The table or view fleet cannot be found."
        );
        assert_eq!(err.code(), "TABLE_OR_VIEW_NOT_FOUND");
    }

    #[test]
    fn test_runtime_error_maps_to_external_failure() {
        let err: PaddockError = RuntimeError::NotFound("web".to_string()).into();
        assert_eq!(err.code(), "EXTERNAL_OPERATION_FAILED");
        assert!(err.to_string().contains("web"));
    }
}
