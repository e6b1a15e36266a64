//! `GET/POST /course/create/`
//!
//! The owner of the new course is always the principal submitting it.

use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
};
use educa_core::{
  form::{CourseForm, FormErrors},
  ownership,
  permission::Permission,
  store::CourseStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  handlers::{CourseSubmission, authorize, clean},
  html, paths,
};

const HEADING: &str = "Create a new course";

/// Empty form.
pub async fn form<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
) -> Result<Html<String>, Error>
where
  S: CourseStore + 'static,
{
  authorize(&principal, Permission::ADD_COURSE)?;

  let subjects = state.store.list_subjects().await.map_err(Error::store)?;
  Ok(Html(html::course_form(
    &principal.username,
    HEADING,
    paths::COURSE_CREATE,
    &CourseForm::default(),
    &FormErrors::default(),
    &subjects,
  )?))
}

async fn rerender<S: CourseStore>(
  store: &S,
  username: &str,
  submitted: &CourseForm,
  errors: &FormErrors,
) -> Result<Response, Error> {
  let subjects = store.list_subjects().await.map_err(Error::store)?;
  let page = html::course_form(
    username,
    HEADING,
    paths::COURSE_CREATE,
    submitted,
    errors,
    &subjects,
  )?;
  Ok(Html(page).into_response())
}

/// Validate, stamp with the principal, persist, and redirect to the list.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(principal): CurrentUser,
  body: Result<CourseSubmission, Error>,
) -> Result<Response, Error>
where
  S: CourseStore + 'static,
{
  authorize(&principal, Permission::ADD_COURSE)?;
  let CourseSubmission(submitted) = body?;

  let fields = match clean(&*state.store, &submitted, None).await? {
    Ok(fields) => fields,
    Err(errors) => {
      return rerender(&*state.store, &principal.username, &submitted, &errors).await;
    }
  };

  let course = match state
    .store
    .create_course(ownership::stamp(&principal, fields))
    .await
  {
    Ok(course) => course,
    Err(e) => {
      // The slug may have been taken after `clean` looked.
      return match clean(&*state.store, &submitted, None).await? {
        Err(errors) => {
          tracing::info!(error = %e, "course create lost a race, re-rendering");
          rerender(&*state.store, &principal.username, &submitted, &errors).await
        }
        Ok(_) => Err(Error::store(e)),
      };
    }
  };

  tracing::info!(
    course_id = %course.course_id,
    owner = %principal.username,
    slug = %course.slug,
    "course created"
  );
  Ok(Redirect::to(paths::COURSE_LIST).into_response())
}
