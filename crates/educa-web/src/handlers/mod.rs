//! Course and account handlers.
//!
//! Every course handler runs the same sequence: the [`CurrentUser`]
//! extractor authenticates, [`authorize`] applies the permission gate and
//! yields the principal's [`OwnerScope`], and only then is the store queried
//! or the submitted form looked at.
//!
//! Submitted course forms are read with [`CourseSubmission`], which accepts
//! urlencoded and multipart bodies and treats any other body as an empty form.
//!
//! [`CurrentUser`]: crate::auth::CurrentUser

pub mod account;
pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use axum::{
  extract::{Form, FromRequest, Multipart, Request},
  http::header,
};
use educa_core::{
  course::CourseFields,
  form::{self, CourseForm, FormErrors},
  gate,
  ownership::OwnerScope,
  permission::Permission,
  principal::Principal,
  store::CourseStore,
};
use uuid::Uuid;

use crate::error::Error;

// ─── Submission ──────────────────────────────────────────────────────────────

/// A course form read from the request body.
///
/// `application/x-www-form-urlencoded` and `multipart/form-data` bodies are
/// decoded; unknown fields are dropped. A missing or other content type
/// yields an empty form, which then fails cleaning like any blank submission.
#[derive(Debug, Clone, Default)]
pub struct CourseSubmission(pub CourseForm);

impl<S> FromRequest<S> for CourseSubmission
where
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let mime = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.split(';').next())
      .map(|v| v.trim().to_ascii_lowercase())
      .unwrap_or_default();

    match mime.as_str() {
      "application/x-www-form-urlencoded" => {
        let Form(form) = Form::<CourseForm>::from_request(req, state).await?;
        Ok(Self(form))
      }
      "multipart/form-data" => {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = CourseForm::default();
        while let Some(field) = multipart.next_field().await? {
          let slot = match field.name() {
            Some("subject") => &mut form.subject,
            Some("title") => &mut form.title,
            Some("slug") => &mut form.slug,
            Some("overview") => &mut form.overview,
            _ => continue,
          };
          *slot = field.text().await?;
        }
        Ok(Self(form))
      }
      other => {
        tracing::debug!(content_type = other, "unreadable course body, treating as empty");
        Ok(Self(CourseForm::default()))
      }
    }
  }
}

// ─── Shared steps ────────────────────────────────────────────────────────────

/// Check `permission` and return the scope the principal may act within.
pub fn authorize(principal: &Principal, permission: Permission) -> Result<OwnerScope, Error> {
  gate::require(principal, permission).inspect_err(|_| {
    tracing::warn!(
      user = %principal.username,
      permission = %permission.qualified(),
      "permission denied"
    );
  })?;
  Ok(OwnerScope::of(principal))
}

/// Course ids in paths are UUIDs; anything else names no course.
pub fn parse_course_id(raw: &str) -> Result<Uuid, Error> {
  Uuid::parse_str(raw).map_err(|_| {
    tracing::debug!(id = raw, "malformed course id");
    Error::NotFound
  })
}

/// Clean a submission and apply the checks that need the store: the subject
/// must exist, and the slug must not be used by any course other than
/// `editing`.
pub async fn clean<S: CourseStore>(
  store: &S,
  submitted: &CourseForm,
  editing: Option<Uuid>,
) -> Result<Result<CourseFields, FormErrors>, Error> {
  let (fields, mut errors) = match submitted.clean() {
    Ok(fields) => (Some(fields), FormErrors::default()),
    Err(errors) => (None, errors),
  };

  if errors.field("subject").is_empty()
    && let Ok(subject_id) = Uuid::parse_str(submitted.subject.trim())
    && store
      .get_subject(subject_id)
      .await
      .map_err(Error::store)?
      .is_none()
  {
    errors.add("subject", form::INVALID_CHOICE);
  }

  let slug = submitted.slug.trim();
  if errors.field("slug").is_empty()
    && store
      .slug_in_use(slug, editing)
      .await
      .map_err(Error::store)?
  {
    errors.add("slug", form::SLUG_TAKEN);
  }

  match fields {
    Some(fields) if errors.is_empty() => Ok(Ok(fields)),
    _ => Ok(Err(errors)),
  }
}
