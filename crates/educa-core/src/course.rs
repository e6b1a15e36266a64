//! The course entity and its editable fields.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ownership::Owned;

/// Longest accepted `title` and `slug`, in characters.
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_SLUG_LEN: usize = 200;

/// A persisted course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
  pub course_id:  Uuid,
  /// Set once at creation to the creating principal.
  pub owner_id:   Uuid,
  pub subject_id: Uuid,
  pub title:      String,
  /// URL-safe key, unique across all courses.
  pub slug:       String,
  pub overview:   String,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
}

impl Owned for Course {
  fn owner_id(&self) -> Uuid { self.owner_id }
}

/// The user-editable fields of a course, as produced by
/// [`CourseForm::clean`](crate::form::CourseForm::clean).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
  pub subject_id: Uuid,
  pub title:      String,
  pub slug:       String,
  pub overview:   String,
}

/// Input to [`CourseStore::create_course`](crate::store::CourseStore::create_course)
/// and [`CourseStore::update_course`](crate::store::CourseStore::update_course).
///
/// Only [`stamp`](crate::ownership::stamp) builds one, so `owner_id` is always
/// the principal who submitted the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
  pub owner_id: Uuid,
  pub fields:   CourseFields,
}

impl Owned for CourseDraft {
  fn owner_id(&self) -> Uuid { self.owner_id }
}
