//! HTTP layer for Educa.
//!
//! Exposes an axum [`Router`] serving owner-scoped course management backed by
//! any [`CourseStore`]. Every course route resolves the current principal,
//! checks the route's permission, and only then touches the store.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod html;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use educa_core::store::CourseStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{account, create, delete, list, update};

// ─── Paths ────────────────────────────────────────────────────────────────────

/// Route paths and redirect targets.
pub mod paths {
  use uuid::Uuid;

  pub const LOGIN: &str = "/accounts/login/";
  pub const LOGOUT: &str = "/accounts/logout/";
  /// Where every successful create, update and delete lands.
  pub const COURSE_LIST: &str = "/course/mine/";
  pub const COURSE_CREATE: &str = "/course/create/";

  pub fn course_edit(course_id: Uuid) -> String {
    format!("/course/{course_id}/edit/")
  }

  pub fn course_delete(course_id: Uuid) -> String {
    format!("/course/{course_id}/delete/")
  }
}

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("educa.db") }
fn default_session_ttl() -> u64 { 60 * 60 * 24 * 14 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `EDUCA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Lifetime of a login session, in seconds.
  #[serde(default = "default_session_ttl")]
  pub session_ttl_secs: u64,
  /// Add the `Secure` attribute to the session cookie.
  #[serde(default)]
  pub secure_cookies:   bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      session_ttl_secs: default_session_ttl(),
      secure_cookies:   false,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the course manager.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CourseStore + 'static,
{
  Router::new()
    .route("/",                    get(account::root))
    .route(paths::LOGIN,           get(account::login_form).post(account::login::<S>))
    .route(paths::LOGOUT,          post(account::logout::<S>))
    .route(paths::COURSE_LIST,     get(list::handler::<S>))
    .route(paths::COURSE_CREATE,   get(create::form::<S>).post(create::submit::<S>))
    .route("/course/{id}/edit/",   get(update::form::<S>).post(update::submit::<S>))
    .route("/course/{id}/delete/", get(delete::confirm::<S>).post(delete::submit::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
