//! Error types and exit codes for filerec
//!
//! Exit codes used by the batch runner:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error or invalid domain value
//! - 3: Data/store error (missing input, unreadable store)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error or invalid value (2)
    Usage = 2,
    /// Data/store error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<rusqlite::Error> for RecError {
    fn from(err: rusqlite::Error) -> Self {
        RecError::FailedOperation {
            operation: "query database".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Errors that can occur in the recommendation core
#[derive(Error, Debug)]
pub enum RecError {
    // Usage errors and invalid domain values (exit code 2)
    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    #[error("unsupported {context}: {value} (supported: {supported})")]
    Unsupported {
        context: String,
        value: String,
        supported: String,
    },

    #[error("unsupported hybrid type: {0} (supported: collaborative, content_based, hybrid)")]
    UnsupportedHybridType(String),

    #[error("similarity {value} outside valid range [{min}, {max}]")]
    SimilarityOutOfRange { value: f64, min: f64, max: f64 },

    #[error("rating {value} outside valid range [{min}, {max}]")]
    RatingOutOfRange { value: f64, min: f64, max: f64 },

    // Data errors (exit code 3)
    #[error("input not found: {path:?}")]
    InputNotFound { path: PathBuf },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to {operation}: {reason}")]
    FailedOperation { operation: String, reason: String },

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperationWithTarget {
        operation: String,
        target: String,
        reason: String,
    },

    #[error("job deadline exceeded after {elapsed_secs}s")]
    DeadlineExceeded { elapsed_secs: u64 },

    #[error("job interrupted; previous results were left in place")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

impl RecError {
    /// Create an error for a failed database operation
    pub fn db_operation(operation: &str, error: impl std::fmt::Display) -> Self {
        RecError::FailedOperation {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for a failed IO operation with context
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        RecError::FailedOperationWithTarget {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        RecError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an unsupported value
    pub fn unsupported(
        context: &str,
        value: impl std::fmt::Display,
        supported: impl std::fmt::Display,
    ) -> Self {
        RecError::Unsupported {
            context: context.to_string(),
            value: value.to_string(),
            supported: supported.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RecError::UsageError(_)
            | RecError::InvalidValue { .. }
            | RecError::Unsupported { .. }
            | RecError::UnsupportedHybridType(_)
            | RecError::SimilarityOutOfRange { .. }
            | RecError::RatingOutOfRange { .. } => ExitCode::Usage,

            RecError::InputNotFound { .. } => ExitCode::Data,

            RecError::Io(_)
            | RecError::Json(_)
            | RecError::Toml(_)
            | RecError::FailedOperation { .. }
            | RecError::FailedOperationWithTarget { .. }
            | RecError::DeadlineExceeded { .. }
            | RecError::Interrupted
            | RecError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            RecError::UsageError(_) => "usage_error",
            RecError::InvalidValue { .. } => "invalid_value",
            RecError::Unsupported { .. } => "unsupported",
            RecError::UnsupportedHybridType(_) => "unsupported_hybrid_type",
            RecError::SimilarityOutOfRange { .. } => "similarity_out_of_range",
            RecError::RatingOutOfRange { .. } => "rating_out_of_range",
            RecError::InputNotFound { .. } => "input_not_found",
            RecError::Io(_) => "io_error",
            RecError::Json(_) => "json_error",
            RecError::Toml(_) => "toml_error",
            RecError::FailedOperation { .. } => "failed_operation",
            RecError::FailedOperationWithTarget { .. } => "failed_operation_with_target",
            RecError::DeadlineExceeded { .. } => "deadline_exceeded",
            RecError::Interrupted => "interrupted",
            RecError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for filerec operations
pub type Result<T> = std::result::Result<T, RecError>;
