//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that text
//! ordering matches time ordering. UUIDs are stored as hyphenated lowercase
//! strings. Permissions are stored by codename.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use educa_core::{
  course::Course, permission::Permission, principal::User, subject::Subject,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Permission ──────────────────────────────────────────────────────────────

pub fn encode_permission(p: Permission) -> String { p.codename() }

pub fn decode_permission(s: &str) -> Result<Permission> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub is_active:     bool,
  pub date_joined:   String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, username, password_hash, is_active, date_joined";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      is_active:     row.get(3)?,
      date_joined:   row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      password_hash: self.password_hash,
      is_active:     self.is_active,
      date_joined:   decode_dt(&self.date_joined)?,
    })
  }
}

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub title:      String,
  pub created_at: String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "subject_id, title, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      title:      row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      title:      self.title,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:  String,
  pub owner_id:   String,
  pub subject_id: String,
  pub title:      String,
  pub slug:       String,
  pub overview:   String,
  pub created_at: String,
}

impl RawCourse {
  pub const COLUMNS: &'static str =
    "course_id, owner_id, subject_id, title, slug, overview, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:  row.get(0)?,
      owner_id:   row.get(1)?,
      subject_id: row.get(2)?,
      title:      row.get(3)?,
      slug:       row.get(4)?,
      overview:   row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:  decode_uuid(&self.course_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      title:      self.title,
      slug:       self.slug,
      overview:   self.overview,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_ordered() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn permission_codename_round_trip() {
    let p = Permission::CHANGE_COURSE;
    assert_eq!(encode_permission(p), "change_course");
    assert_eq!(decode_permission("change_course").unwrap(), p);
    assert!(decode_permission("teach_course").is_err());
  }
}
