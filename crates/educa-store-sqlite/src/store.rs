//! The SQLite implementation of [`CourseStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use educa_core::{
  course::{Course, CourseDraft},
  ownership::OwnerScope,
  permission::{Permission, PermissionSet},
  principal::{NewUser, Session, User},
  store::CourseStore,
  subject::Subject,
};

use crate::{
  Error, Result,
  encode::{
    RawCourse, RawSubject, RawUser, decode_permission, encode_dt,
    encode_permission, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Educa store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one course by id, ignoring ownership. Only called after a scoped
  /// write has already matched the row.
  async fn course_by_id(&self, course_id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(course_id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM courses WHERE course_id = ?1",
                RawCourse::COLUMNS
              ),
              rusqlite::params![id_str],
              RawCourse::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }
}

// ─── CourseStore impl ────────────────────────────────────────────────────────

impl CourseStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      password_hash: input.password_hash,
      is_active:     true,
      date_joined:   now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(user.date_joined);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, is_active, date_joined)
           VALUES (?1, ?2, ?3, 1, ?4)",
          rusqlite::params![id_str, username, hash, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_write)?;

    tracing::debug!(user_id = %user.user_id, username = %user.username, "created user");
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE username = ?1", RawUser::COLUMNS),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<()> {
    let id_str = encode_uuid(user_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET is_active = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, active],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Permissions ───────────────────────────────────────────────────────────

  async fn grant_permission(
    &self,
    user_id:    Uuid,
    permission: Permission,
  ) -> Result<bool> {
    let id_str   = encode_uuid(user_id);
    let codename = encode_permission(permission);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO user_permissions (user_id, codename) VALUES (?1, ?2)",
          rusqlite::params![id_str, codename],
        )?)
      })
      .await
      .map_err(Error::from_write)?;

    Ok(inserted > 0)
  }

  async fn user_permissions(&self, user_id: Uuid) -> Result<PermissionSet> {
    let id_str = encode_uuid(user_id);

    let codenames: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT codename FROM user_permissions WHERE user_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    codenames.iter().map(|c| decode_permission(c)).collect()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_write)?;
    Ok(())
  }

  async fn session_user(
    &self,
    token_hash: &str,
    now:        DateTime<Utc>,
  ) -> Result<Option<Uuid>> {
    let token_hash = token_hash.to_owned();
    let now_str    = encode_dt(now);

    let user_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
              rusqlite::params![token_hash, now_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    user_str
      .map(|s| Uuid::parse_str(&s))
      .transpose()
      .map_err(Error::Uuid)
  }

  async fn delete_session(&self, token_hash: &str) -> Result<()> {
    let token_hash = token_hash.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
    let now_str = encode_dt(now);

    let purged = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE expires_at <= ?1",
          rusqlite::params![now_str],
        )?)
      })
      .await?;

    if purged > 0 {
      tracing::debug!(purged, "expired sessions removed");
    }
    Ok(purged)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, title: &str) -> Result<Subject> {
    let subject = Subject {
      subject_id: Uuid::new_v4(),
      title:      title.to_owned(),
      created_at: now(),
    };

    let id_str    = encode_uuid(subject.subject_id);
    let title_str = subject.title.clone();
    let at_str    = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, title, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, title_str, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_write)?;

    Ok(subject)
  }

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM subjects WHERE subject_id = ?1",
                RawSubject::COLUMNS
              ),
              rusqlite::params![id_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM subjects ORDER BY title",
          RawSubject::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn create_course(&self, draft: CourseDraft) -> Result<Course> {
    let course = Course {
      course_id:  Uuid::new_v4(),
      owner_id:   draft.owner_id,
      subject_id: draft.fields.subject_id,
      title:      draft.fields.title,
      slug:       draft.fields.slug,
      overview:   draft.fields.overview,
      created_at: now(),
    };

    let id_str      = encode_uuid(course.course_id);
    let owner_str   = encode_uuid(course.owner_id);
    let subject_str = encode_uuid(course.subject_id);
    let title       = course.title.clone();
    let slug        = course.slug.clone();
    let overview    = course.overview.clone();
    let at_str      = encode_dt(course.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (
             course_id, owner_id, subject_id, title, slug, overview, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            owner_str,
            subject_str,
            title,
            slug,
            overview,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_write)?;

    Ok(course)
  }

  async fn list_courses(&self, scope: OwnerScope) -> Result<Vec<Course>> {
    let owner_str = encode_uuid(scope.owner_id());

    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM courses
           WHERE owner_id = ?1
           ORDER BY created_at DESC, rowid DESC",
          RawCourse::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawCourse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn get_course(
    &self,
    scope:     OwnerScope,
    course_id: Uuid,
  ) -> Result<Option<Course>> {
    let id_str    = encode_uuid(course_id);
    let owner_str = encode_uuid(scope.owner_id());

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM courses WHERE course_id = ?1 AND owner_id = ?2",
                RawCourse::COLUMNS
              ),
              rusqlite::params![id_str, owner_str],
              RawCourse::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn update_course(
    &self,
    scope:     OwnerScope,
    course_id: Uuid,
    draft:     CourseDraft,
  ) -> Result<Option<Course>> {
    // A draft stamped for someone else can never touch this scope's rows.
    if !scope.admits(&draft) {
      return Ok(None);
    }

    let id_str      = encode_uuid(course_id);
    let owner_str   = encode_uuid(scope.owner_id());
    let subject_str = encode_uuid(draft.fields.subject_id);
    let fields      = draft.fields;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE courses
           SET subject_id = ?3, title = ?4, slug = ?5, overview = ?6
           WHERE course_id = ?1 AND owner_id = ?2",
          rusqlite::params![
            id_str,
            owner_str,
            subject_str,
            fields.title,
            fields.slug,
            fields.overview,
          ],
        )?)
      })
      .await
      .map_err(Error::from_write)?;

    if changed == 0 {
      return Ok(None);
    }
    self.course_by_id(course_id).await
  }

  async fn delete_course(&self, scope: OwnerScope, course_id: Uuid) -> Result<bool> {
    let id_str    = encode_uuid(course_id);
    let owner_str = encode_uuid(scope.owner_id());

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM courses WHERE course_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn slug_in_use(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
    let slug        = slug.to_owned();
    let exclude_str = exclude.map(encode_uuid);

    let taken = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM courses
               WHERE slug = ?1 AND (?2 IS NULL OR course_id != ?2)",
              rusqlite::params![slug, exclude_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(taken)
  }
}
