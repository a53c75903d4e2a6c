use sea_orm::{DbErr, SqlErr};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected provider payload: {0}")]
    Payload(String),

    #[error("batch aborted at id {id}: {source}")]
    BatchAborted {
        id: i64,
        #[source]
        source: Box<AppError>,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl AppError {
    /// Failures worth a second attempt inside a sync window. A malformed
    /// payload fails the same way every time, so it is not one of them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Http(_) | AppError::Upstream { .. })
    }

    /// Maps constraint violations onto `Conflict`/`NotFound`, everything else
    /// stays a database error.
    pub fn from_write(err: DbErr, what: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(format!("{what} already exists"))
            },
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::NotFound(format!("{what} references a missing record"))
            },
            _ => AppError::Database(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
