//! Error type for `educa-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] educa_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A UNIQUE or FOREIGN KEY constraint rejected the write.
  #[error("conflict: {0}")]
  Conflict(String),
}

impl Error {
  /// Reclassify constraint violations as [`Error::Conflict`].
  pub(crate) fn from_write(e: tokio_rusqlite::Error) -> Self {
    match &e {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        failure,
        message,
      )) if failure.code == rusqlite::ErrorCode::ConstraintViolation => {
        Error::Conflict(message.clone().unwrap_or_else(|| failure.to_string()))
      }
      _ => Error::Database(e),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
