//! `GET /course/mine/`: the principal's own courses.

use axum::{extract::State, response::Html};
use educa_core::{permission::Permission, store::CourseStore};

use crate::{AppState, auth::CurrentUser, error::Error, handlers::authorize, html};

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
) -> Result<Html<String>, Error>
where
  S: CourseStore + 'static,
{
  let scope = authorize(&principal, Permission::VIEW_COURSE)?;

  let courses = state
    .store
    .list_courses(scope)
    .await
    .map_err(Error::store)?;
  let subjects = state.store.list_subjects().await.map_err(Error::store)?;

  Ok(Html(html::course_list(&principal.username, &courses, &subjects)?))
}
