//! Login, logout and the site root.

use axum::{
  extract::{Form, Query, State},
  http::{HeaderMap, header},
  response::{Html, IntoResponse, Redirect, Response},
};
use educa_core::store::CourseStore;
use serde::Deserialize;

use crate::{
  AppState,
  auth::{self, authenticate, hash_token, safe_next, session_cookie, start_session},
  error::Error,
  html, paths,
};

pub const BAD_LOGIN: &str = "Please enter a correct username and password.";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
  pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
  pub next:     Option<String>,
}

/// `GET /`
pub async fn root() -> Redirect { Redirect::to(paths::COURSE_LIST) }

/// `GET /accounts/login/`
pub async fn login_form(Query(query): Query<LoginQuery>) -> Result<Html<String>, Error> {
  let next = safe_next(query.next.as_deref());
  Ok(Html(html::login("", next, None)?))
}

/// `POST /accounts/login/`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<LoginForm>,
) -> Result<Response, Error>
where
  S: CourseStore + 'static,
{
  let next = safe_next(form.next.as_deref());

  let Some(user) = authenticate(&*state.store, form.username.trim(), &form.password).await? else {
    tracing::warn!(username = %form.username, "failed login");
    let page = html::login(&form.username, next, Some(BAD_LOGIN))?;
    return Ok(Html(page).into_response());
  };

  let cookie = start_session(&state, user.user_id).await?;
  tracing::info!(user = %user.username, "logged in");
  Ok(([(header::SET_COOKIE, cookie)], Redirect::to(next)).into_response())
}

/// `POST /accounts/logout/`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: CourseStore + 'static,
{
  if let Some(token) = session_cookie(&headers) {
    state
      .store
      .delete_session(&hash_token(token))
      .await
      .map_err(Error::store)?;
  }
  Ok(
    (
      [(header::SET_COOKIE, auth::clear_cookie_header())],
      Redirect::to(paths::LOGIN),
    )
      .into_response(),
  )
}
