//! Users and the authenticated principal derived from them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::permission::{Permission, PermissionSet};

/// A stored user account.
#[derive(Debug, Clone)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  /// Inactive users cannot authenticate.
  pub is_active:     bool,
  pub date_joined:   DateTime<Utc>,
}

/// Input to [`CourseStore::create_user`](crate::store::CourseStore::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
}

/// The authenticated actor of a request, with its granted capabilities.
///
/// Handlers receive this explicitly; nothing looks it up from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub user_id:     Uuid,
  pub username:    String,
  pub permissions: PermissionSet,
}

impl Principal {
  pub fn new(user: &User, permissions: PermissionSet) -> Self {
    Self {
      user_id: user.user_id,
      username: user.username.clone(),
      permissions,
    }
  }

  pub fn has_perm(&self, permission: Permission) -> bool {
    self.permissions.contains(permission)
  }
}

/// A server-side login session. Only a digest of the client's token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  /// SHA-256 hex digest of the cookie token.
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}
