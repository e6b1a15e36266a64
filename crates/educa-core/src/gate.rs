//! Permission gate: checked before any handler logic runs.

use crate::{Error, Result, permission::Permission, principal::Principal};

/// Allow the request through if `principal` holds `permission`.
///
/// - No IO
/// - No side effects
pub fn require(principal: &Principal, permission: Permission) -> Result<()> {
  if principal.has_perm(permission) {
    Ok(())
  } else {
    Err(Error::PermissionDenied(permission))
  }
}
