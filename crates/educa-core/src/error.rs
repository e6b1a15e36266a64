//! Error types for `educa-core`.

use thiserror::Error;

use crate::permission::Permission;

#[derive(Debug, Error)]
pub enum Error {
  #[error("permission denied: missing '{}'", .0.qualified())]
  PermissionDenied(Permission),

  #[error("unknown permission: {0:?}")]
  UnknownPermission(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
