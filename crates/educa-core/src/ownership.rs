//! Ownership filter and ownership stamper.
//!
//! [`OwnerScope`] narrows every course lookup to rows owned by the current
//! principal; storage backends apply it in their queries. [`stamp`] turns a
//! cleaned submission into a [`CourseDraft`] owned by the current principal,
//! whatever the client sent.

use uuid::Uuid;

use crate::{
  course::{CourseDraft, CourseFields},
  principal::Principal,
};

/// Resources that have a single owning principal.
pub trait Owned {
  fn owner_id(&self) -> Uuid;
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Restricts visible and mutable rows to those owned by one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
  owner_id: Uuid,
}

impl OwnerScope {
  pub fn of(principal: &Principal) -> Self {
    Self {
      owner_id: principal.user_id,
    }
  }

  pub fn owner_id(&self) -> Uuid { self.owner_id }

  pub fn admits<T: Owned + ?Sized>(&self, item: &T) -> bool {
    item.owner_id() == self.owner_id
  }
}

// ─── Stamper ─────────────────────────────────────────────────────────────────

/// Attach `principal` as the owner of a cleaned submission.
pub fn stamp(principal: &Principal, fields: CourseFields) -> CourseDraft {
  CourseDraft {
    owner_id: principal.user_id,
    fields,
  }
}
