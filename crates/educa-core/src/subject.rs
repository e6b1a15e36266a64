//! The category label a course is filed under.
//!
//! Subjects are administered independently of course management; courses
//! reference them but never own them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
  pub subject_id: Uuid,
  pub title:      String,
  pub created_at: DateTime<Utc>,
}
