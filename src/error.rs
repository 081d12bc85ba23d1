//! Error types for the Anwesende core

use thiserror::Error;

/// Numeric error codes, used as the exit status of the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 3,
    NoSuchSeat = 5,
    Duplicate = 8,
    BadValue = 18,
    BadImportFormat = 30,
    PreconditionViolated = 31,
}

impl ErrorCode {
    /// Code for an error that reached the top of the binary
    pub fn of(err: &anyhow::Error) -> Self {
        err.downcast_ref::<AppError>()
            .map_or(ErrorCode::Failure, AppError::code)
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Unusable spreadsheet row data; the whole import is rolled back
    #[error("Import format error: {0}")]
    ImportFormat(String),

    /// Programmer or input error, e.g. comparing seats of different rooms
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ImportFormat(_) => ErrorCode::BadImportFormat,
            AppError::PreconditionViolation(_) => ErrorCode::PreconditionViolated,
            AppError::NotFound(_) => ErrorCode::NoSuchSeat,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorCode::DbFailure
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                ErrorCode::DbFailure
            }
            AppError::Config(_) | AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
