//! `GET/POST /course/{id}/edit/`
//!
//! Only courses inside the principal's scope can be edited; any other id is
//! a 404. The owner column is never rewritten.

use axum::{
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use educa_core::{
  course::Course,
  form::{CourseForm, FormErrors},
  ownership::{self, OwnerScope},
  permission::Permission,
  store::CourseStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  handlers::{CourseSubmission, authorize, clean, parse_course_id},
  html, paths,
};

const HEADING: &str = "Edit course";

async fn owned_course<S: CourseStore>(
  store: &S,
  scope: OwnerScope,
  course_id: Uuid,
) -> Result<Course, Error> {
  store
    .get_course(scope, course_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      tracing::debug!(%course_id, owner = %scope.owner_id(), "course not in scope");
      Error::NotFound
    })
}

async fn rerender<S: CourseStore>(
  store: &S,
  username: &str,
  course_id: Uuid,
  submitted: &CourseForm,
  errors: &FormErrors,
) -> Result<Response, Error> {
  let subjects = store.list_subjects().await.map_err(Error::store)?;
  let page = html::course_form(
    username,
    HEADING,
    &paths::course_edit(course_id),
    submitted,
    errors,
    &subjects,
  )?;
  Ok(Html(page).into_response())
}

/// Form pre-filled with the stored values.
pub async fn form<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
  Path(id): Path<String>,
) -> Result<Html<String>, Error>
where
  S: CourseStore + 'static,
{
  let scope = authorize(&principal, Permission::CHANGE_COURSE)?;
  let course_id = parse_course_id(&id)?;
  let course = owned_course(&*state.store, scope, course_id).await?;

  let subjects = state.store.list_subjects().await.map_err(Error::store)?;
  Ok(Html(html::course_form(
    &principal.username,
    HEADING,
    &paths::course_edit(course_id),
    &CourseForm::from(&course),
    &FormErrors::default(),
    &subjects,
  )?))
}

/// Validate, stamp, overwrite inside the scope, and redirect to the list.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
  Path(id): Path<String>,
  body: Result<CourseSubmission, Error>,
) -> Result<Response, Error>
where
  S: CourseStore + 'static,
{
  let scope = authorize(&principal, Permission::CHANGE_COURSE)?;
  let course_id = parse_course_id(&id)?;
  owned_course(&*state.store, scope, course_id).await?;
  let CourseSubmission(submitted) = body?;

  let fields = match clean(&*state.store, &submitted, Some(course_id)).await? {
    Ok(fields) => fields,
    Err(errors) => {
      return rerender(&*state.store, &principal.username, course_id, &submitted, &errors)
        .await;
    }
  };

  let updated = match state
    .store
    .update_course(scope, course_id, ownership::stamp(&principal, fields))
    .await
  {
    Ok(updated) => updated,
    Err(e) => {
      // The slug may have been taken after `clean` looked.
      return match clean(&*state.store, &submitted, Some(course_id)).await? {
        Err(errors) => {
          tracing::info!(error = %e, %course_id, "course update lost a race, re-rendering");
          rerender(&*state.store, &principal.username, course_id, &submitted, &errors).await
        }
        Ok(_) => Err(Error::store(e)),
      };
    }
  };
  let course = updated.ok_or(Error::NotFound)?;

  tracing::info!(
    course_id = %course.course_id,
    owner = %principal.username,
    "course updated"
  );
  Ok(Redirect::to(paths::COURSE_LIST).into_response())
}
