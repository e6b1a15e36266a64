//! The `CourseStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `educa-store-sqlite`).
//! The web layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  course::{Course, CourseDraft},
  ownership::OwnerScope,
  permission::{Permission, PermissionSet},
  principal::{NewUser, Session, User},
  subject::Subject,
};

/// Abstraction over an Educa store backend.
///
/// Every course read or write other than creation takes an [`OwnerScope`];
/// rows outside the scope behave exactly as if they did not exist.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CourseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create an active user. Fails if the username is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Mark a user active or inactive.
  fn set_user_active(
    &self,
    user_id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Permissions ───────────────────────────────────────────────────────

  /// Grant `permission` to a user. Returns `false` if it was already held.
  fn grant_permission(
    &self,
    user_id: Uuid,
    permission: Permission,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn user_permissions(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<PermissionSet, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user owning an unexpired session with this token digest.
  fn session_user<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete every session that expired at or before `now`; returns how many.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create a subject. Fails if the title is taken.
  fn add_subject<'a>(
    &'a self,
    title: &'a str,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + 'a;

  fn get_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects, ordered by title.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  /// Persist a new course owned by `draft.owner_id`. `created_at` is set by
  /// the store.
  fn create_course(
    &self,
    draft: CourseDraft,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  /// Courses inside `scope`, newest first.
  fn list_courses(
    &self,
    scope: OwnerScope,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  /// A single course, or `None` if it does not exist or is outside `scope`.
  fn get_course(
    &self,
    scope: OwnerScope,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// Overwrite the editable fields of a course inside `scope`. The owner
  /// column is never rewritten. Returns `None` if nothing matched.
  fn update_course(
    &self,
    scope: OwnerScope,
    course_id: Uuid,
    draft: CourseDraft,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// Remove a course inside `scope`. Returns `false` if nothing matched.
  fn delete_course(
    &self,
    scope: OwnerScope,
    course_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Whether any course other than `exclude` already uses `slug`. Slugs are
  /// unique across all owners.
  fn slug_in_use<'a>(
    &'a self,
    slug: &'a str,
    exclude: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
