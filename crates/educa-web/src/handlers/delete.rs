//! `GET/POST /course/{id}/delete/`
//!
//! `GET` asks for confirmation; `POST` removes the course. Ids outside the
//! principal's scope are a 404 for both.

use axum::{
  extract::{Path, State},
  response::{Html, Redirect},
};
use educa_core::{permission::Permission, store::CourseStore};

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  handlers::{authorize, parse_course_id},
  html, paths,
};

pub async fn confirm<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
  Path(id): Path<String>,
) -> Result<Html<String>, Error>
where
  S: CourseStore + 'static,
{
  let scope = authorize(&principal, Permission::DELETE_COURSE)?;
  let course_id = parse_course_id(&id)?;

  let course = state
    .store
    .get_course(scope, course_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  Ok(Html(html::course_delete(&principal.username, &course)?))
}

pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
  Path(id): Path<String>,
) -> Result<Redirect, Error>
where
  S: CourseStore + 'static,
{
  let scope = authorize(&principal, Permission::DELETE_COURSE)?;
  let course_id = parse_course_id(&id)?;

  let deleted = state
    .store
    .delete_course(scope, course_id)
    .await
    .map_err(Error::store)?;
  if !deleted {
    tracing::debug!(%course_id, owner = %scope.owner_id(), "course not in scope");
    return Err(Error::NotFound);
  }

  tracing::info!(%course_id, owner = %principal.username, "course deleted");
  Ok(Redirect::to(paths::COURSE_LIST))
}
