//! Authentication: password hashing, login sessions and the current-user
//! extractor.
//!
//! A principal is resolved from the `sessionid` cookie first and from an HTTP
//! `Authorization: Basic` header second. Either way the user must exist and
//! be active.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{Duration, Utc};
use educa_core::{
  principal::{Principal, Session, User},
  store::CourseStore,
};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use crate::{AppState, ServerConfig, error::Error, paths};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Longer configured lifetimes are clamped to this (100 years).
pub const MAX_SESSION_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Session tokens ──────────────────────────────────────────────────────────

/// A fresh random session token, hex-encoded. Given to the client only.
pub fn new_session_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The digest under which a token is stored.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// The session token sent by the client, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
    .map(|(_, value)| value)
}

/// Configured session lifetime, clamped to [`MAX_SESSION_TTL_SECS`]. Both the
/// stored expiry and the cookie's `Max-Age` use this value.
pub fn session_ttl_secs(config: &ServerConfig) -> u64 {
  config.session_ttl_secs.min(MAX_SESSION_TTL_SECS)
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie_header(token: &str, config: &ServerConfig) -> String {
  let mut cookie = format!(
    "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
    session_ttl_secs(config)
  );
  if config.secure_cookies {
    cookie.push_str("; Secure");
  }
  cookie
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_cookie_header() -> String {
  format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ─── Basic credentials ───────────────────────────────────────────────────────

/// Decode an `Authorization: Basic` header. The scheme name matches
/// case-insensitively.
///
/// `Ok(None)` means no `Authorization` header was sent; a header that is
/// present but unreadable is `Err(Unauthorized)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, Error> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| Error::Unauthorized)?;

  let (scheme, encoded) = value.trim_start().split_once(' ').ok_or(Error::Unauthorized)?;
  if !scheme.eq_ignore_ascii_case("Basic") {
    return Err(Error::Unauthorized);
  }
  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok(Some((username.to_owned(), password.to_owned())))
}

// ─── Store-backed steps ──────────────────────────────────────────────────────

/// The active user with these credentials, if any.
pub async fn authenticate<S: CourseStore>(
  store: &S,
  username: &str,
  password: &str,
) -> Result<Option<User>, Error> {
  let user = store.find_user(username).await.map_err(Error::store)?;
  Ok(user.filter(|u| u.is_active && verify_password(password, &u.password_hash)))
}

/// Build the principal for an active user, with their granted permissions.
pub async fn load_principal<S: CourseStore>(
  store: &S,
  user_id: Uuid,
) -> Result<Option<Principal>, Error> {
  let Some(user) = store.get_user(user_id).await.map_err(Error::store)? else {
    return Ok(None);
  };
  if !user.is_active {
    return Ok(None);
  }
  let permissions = store
    .user_permissions(user_id)
    .await
    .map_err(Error::store)?;
  Ok(Some(Principal::new(&user, permissions)))
}

/// Open a session for `user_id` and return the `Set-Cookie` value for it.
///
/// Sessions that have already expired are purged first.
pub async fn start_session<S: CourseStore>(
  state: &AppState<S>,
  user_id: Uuid,
) -> Result<String, Error> {
  let token = new_session_token();
  let now = Utc::now();
  let expires_at = now + Duration::seconds(session_ttl_secs(&state.config) as i64);

  state
    .store
    .purge_expired_sessions(now)
    .await
    .map_err(Error::store)?;

  state
    .store
    .create_session(Session {
      token_hash: hash_token(&token),
      user_id,
      created_at: now,
      expires_at,
    })
    .await
    .map_err(Error::store)?;

  Ok(session_cookie_header(&token, &state.config))
}

/// `next` if it is a path on this site, otherwise the course list.
pub fn safe_next(next: Option<&str>) -> &str {
  match next {
    Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
    _ => paths::COURSE_LIST,
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated principal of the current request.
///
/// Rejects with a redirect to the login page when no credentials are
/// presented, and with `401` when Basic credentials are presented but wrong.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: CourseStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if let Some(token) = session_cookie(&parts.headers) {
      let user_id = state
        .store
        .session_user(&hash_token(token), Utc::now())
        .await
        .map_err(Error::store)?;
      if let Some(user_id) = user_id
        && let Some(principal) = load_principal(&*state.store, user_id).await?
      {
        return Ok(CurrentUser(principal));
      }
    }

    if let Some((username, password)) = basic_credentials(&parts.headers)? {
      let user = authenticate(&*state.store, &username, &password)
        .await?
        .ok_or(Error::Unauthorized)?;
      let principal = load_principal(&*state.store, user.user_id)
        .await?
        .ok_or(Error::Unauthorized)?;
      return Ok(CurrentUser(principal));
    }

    let next = parts
      .uri
      .path_and_query()
      .map(|pq| pq.as_str().to_owned())
      .unwrap_or_else(|| parts.uri.path().to_owned());
    Err(Error::LoginRequired { next })
  }
}
