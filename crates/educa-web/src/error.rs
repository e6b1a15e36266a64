//! Error types and axum `IntoResponse` implementation.

use axum::{
  extract::{
    multipart::{MultipartError, MultipartRejection},
    rejection::FormRejection,
  },
  http::{HeaderValue, StatusCode, header},
  response::{Html, IntoResponse, Redirect, Response},
};
use educa_core::permission::Permission;
use thiserror::Error;

use crate::{html, paths};

#[derive(Debug, Error)]
pub enum Error {
  /// No principal could be resolved; the client is sent to the login page
  /// and returned to `next` afterwards.
  #[error("login required")]
  LoginRequired { next: String },
  /// Credentials were presented in an `Authorization` header and rejected.
  #[error("unauthorized")]
  Unauthorized,
  #[error("forbidden: missing '{}'", .0.qualified())]
  Forbidden(Permission),
  #[error("not found")]
  NotFound,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("render error: {0}")]
  Render(#[from] std::io::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

impl From<educa_core::Error> for Error {
  fn from(e: educa_core::Error) -> Self {
    match e {
      educa_core::Error::PermissionDenied(p) => Error::Forbidden(p),
      other => Error::BadRequest(other.to_string()),
    }
  }
}

impl From<FormRejection> for Error {
  fn from(e: FormRejection) -> Self { Error::BadRequest(e.body_text()) }
}

impl From<MultipartRejection> for Error {
  fn from(e: MultipartRejection) -> Self { Error::BadRequest(e.body_text()) }
}

impl From<MultipartError> for Error {
  fn from(e: MultipartError) -> Self { Error::BadRequest(e.body_text()) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::LoginRequired { next } => {
        let target =
          format!("{}?next={}", paths::LOGIN, urlencoding::encode(&next));
        Redirect::to(&target).into_response()
      }
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"educa\""),
        );
        res
      }
      Error::Forbidden(_) => status_page(StatusCode::FORBIDDEN),
      Error::NotFound => status_page(StatusCode::NOT_FOUND),
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::Render(e) => {
        tracing::error!(error = %e, "failed to render page");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
    }
  }
}

fn status_page(status: StatusCode) -> Response {
  let reason = status.canonical_reason().unwrap_or("Error");
  match html::status_page(status.as_u16(), reason) {
    Ok(body) => (status, Html(body)).into_response(),
    Err(_) => (status, reason.to_owned()).into_response(),
  }
}
