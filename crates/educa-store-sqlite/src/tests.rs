//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use educa_core::{
  course::{CourseDraft, CourseFields},
  ownership::OwnerScope,
  permission::{Entity, Permission},
  principal::{NewUser, Principal, Session, User},
  store::CourseStore,
  subject::Subject,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.create_user(NewUser {
    username:      name.into(),
    password_hash: "$argon2id$unused".into(),
  })
  .await
  .unwrap()
}

async fn scope_of(s: &SqliteStore, u: &User) -> OwnerScope {
  let perms = s.user_permissions(u.user_id).await.unwrap();
  OwnerScope::of(&Principal::new(u, perms))
}

fn draft(owner: &User, subject: &Subject, title: &str, slug: &str) -> CourseDraft {
  CourseDraft {
    owner_id: owner.user_id,
    fields:   CourseFields {
      subject_id: subject.subject_id,
      title:      title.into(),
      slug:       slug.into(),
      overview:   format!("{title} overview"),
    },
  }
}

// ─── Users & permissions ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_user() {
  let s = store().await;
  let created = user(&s, "testuser").await;
  assert!(created.is_active);

  let by_name = s.find_user("testuser").await.unwrap().unwrap();
  assert_eq!(by_name.user_id, created.user_id);

  let by_id = s.get_user(created.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "testuser");

  assert!(s.find_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
  let s = store().await;
  user(&s, "testuser").await;
  let err = s
    .create_user(NewUser {
      username:      "testuser".into(),
      password_hash: "x".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn deactivate_user() {
  let s = store().await;
  let u = user(&s, "testuser").await;
  s.set_user_active(u.user_id, false).await.unwrap();
  assert!(!s.get_user(u.user_id).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn grant_and_read_permissions() {
  let s = store().await;
  let u = user(&s, "testuser").await;
  assert!(s.user_permissions(u.user_id).await.unwrap().is_empty());

  for p in Permission::all_for(Entity::Course) {
    assert!(s.grant_permission(u.user_id, p).await.unwrap());
  }
  // Granting twice is a no-op.
  assert!(!s.grant_permission(u.user_id, Permission::VIEW_COURSE).await.unwrap());

  let perms = s.user_permissions(u.user_id).await.unwrap();
  assert_eq!(perms.len(), 4);
  assert!(perms.contains(Permission::DELETE_COURSE));
  assert!(!perms.contains(Permission::new(
    educa_core::permission::Action::View,
    Entity::Subject
  )));
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_lifecycle() {
  let s = store().await;
  let u = user(&s, "testuser").await;
  let now = Utc::now();

  s.create_session(Session {
    token_hash: "abc".into(),
    user_id:    u.user_id,
    created_at: now,
    expires_at: now + Duration::hours(1),
  })
  .await
  .unwrap();

  assert_eq!(s.session_user("abc", now).await.unwrap(), Some(u.user_id));
  assert_eq!(s.session_user("zzz", now).await.unwrap(), None);

  s.delete_session("abc").await.unwrap();
  assert_eq!(s.session_user("abc", now).await.unwrap(), None);
}

#[tokio::test]
async fn expired_session_is_ignored() {
  let s = store().await;
  let u = user(&s, "testuser").await;
  let now = Utc::now();

  s.create_session(Session {
    token_hash: "old".into(),
    user_id:    u.user_id,
    created_at: now - Duration::days(15),
    expires_at: now - Duration::days(1),
  })
  .await
  .unwrap();

  assert_eq!(s.session_user("old", now).await.unwrap(), None);
}

#[tokio::test]
async fn purge_removes_only_expired_sessions() {
  let s = store().await;
  let u = user(&s, "testuser").await;
  let now = Utc::now();

  for i in 0..5 {
    s.create_session(Session {
      token_hash: format!("stale-{i}"),
      user_id:    u.user_id,
      created_at: now - Duration::days(15),
      expires_at: now - Duration::minutes(i + 1),
    })
    .await
    .unwrap();
  }
  s.create_session(Session {
    token_hash: "live".into(),
    user_id:    u.user_id,
    created_at: now,
    expires_at: now + Duration::hours(1),
  })
  .await
  .unwrap();

  assert_eq!(s.purge_expired_sessions(now).await.unwrap(), 5);
  assert_eq!(s.session_user("live", now).await.unwrap(), Some(u.user_id));
  assert_eq!(s.purge_expired_sessions(now).await.unwrap(), 0);
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subjects_are_listed_by_title() {
  let s = store().await;
  s.add_subject("Physics").await.unwrap();
  let maths = s.add_subject("Mathematics").await.unwrap();
  s.add_subject("Programming").await.unwrap();

  let titles: Vec<String> = s
    .list_subjects()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.title)
    .collect();
  assert_eq!(titles, ["Mathematics", "Physics", "Programming"]);

  let fetched = s.get_subject(maths.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched, maths);
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_subject_title_is_a_conflict() {
  let s = store().await;
  s.add_subject("Physics").await.unwrap();
  assert!(matches!(
    s.add_subject("Physics").await,
    Err(Error::Conflict(_))
  ));
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_course() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let subject = s.add_subject("Test Subject").await.unwrap();

  let course = s
    .create_course(draft(&alice, &subject, "Test Course", "test-course"))
    .await
    .unwrap();
  assert_eq!(course.owner_id, alice.user_id);
  assert_eq!(course.subject_id, subject.subject_id);

  let scope = scope_of(&s, &alice).await;
  let fetched = s.get_course(scope, course.course_id).await.unwrap().unwrap();
  assert_eq!(fetched, course);
}

#[tokio::test]
async fn list_is_owner_scoped_and_newest_first() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let subject = s.add_subject("Test Subject").await.unwrap();

  s.create_course(draft(&alice, &subject, "First", "first")).await.unwrap();
  s.create_course(draft(&bob, &subject, "Bob's", "bobs")).await.unwrap();
  s.create_course(draft(&alice, &subject, "Second", "second")).await.unwrap();

  let titles: Vec<String> = s
    .list_courses(scope_of(&s, &alice).await)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.title)
    .collect();
  assert_eq!(titles, ["Second", "First"]);

  let bobs = s.list_courses(scope_of(&s, &bob).await).await.unwrap();
  assert_eq!(bobs.len(), 1);
  assert_eq!(bobs[0].owner_id, bob.user_id);
}

#[tokio::test]
async fn get_outside_scope_is_none() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let subject = s.add_subject("Test Subject").await.unwrap();
  let course = s
    .create_course(draft(&alice, &subject, "Test Course", "test-course"))
    .await
    .unwrap();

  let bob_scope = scope_of(&s, &bob).await;
  assert!(s.get_course(bob_scope, course.course_id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_changes_fields_but_not_owner() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let subject = s.add_subject("Test Subject").await.unwrap();
  let other = s.add_subject("Other Subject").await.unwrap();
  let course = s
    .create_course(draft(&alice, &subject, "Test Course", "test-course"))
    .await
    .unwrap();

  let scope = scope_of(&s, &alice).await;
  let updated = s
    .update_course(
      scope,
      course.course_id,
      draft(&alice, &other, "Updated Course", "updated-course"),
    )
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.title, "Updated Course");
  assert_eq!(updated.slug, "updated-course");
  assert_eq!(updated.subject_id, other.subject_id);
  assert_eq!(updated.owner_id, alice.user_id);
  assert_eq!(updated.created_at, course.created_at);
}

#[tokio::test]
async fn update_outside_scope_leaves_row_untouched() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let subject = s.add_subject("Test Subject").await.unwrap();
  let course = s
    .create_course(draft(&alice, &subject, "Test Course", "test-course"))
    .await
    .unwrap();

  // Bob's own draft against Alice's course.
  let bob_scope = scope_of(&s, &bob).await;
  let result = s
    .update_course(
      bob_scope,
      course.course_id,
      draft(&bob, &subject, "Hijacked", "hijacked"),
    )
    .await
    .unwrap();
  assert!(result.is_none());

  // A draft stamped for Bob inside Alice's scope is refused too.
  let alice_scope = scope_of(&s, &alice).await;
  let result = s
    .update_course(
      alice_scope,
      course.course_id,
      draft(&bob, &subject, "Reassigned", "reassigned"),
    )
    .await
    .unwrap();
  assert!(result.is_none());

  let stored = s.get_course(alice_scope, course.course_id).await.unwrap().unwrap();
  assert_eq!(stored, course);
}

#[tokio::test]
async fn delete_is_owner_scoped() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let subject = s.add_subject("Test Subject").await.unwrap();
  let course = s
    .create_course(draft(&alice, &subject, "Test Course", "test-course"))
    .await
    .unwrap();

  let bob_scope = scope_of(&s, &bob).await;
  assert!(!s.delete_course(bob_scope, course.course_id).await.unwrap());

  let alice_scope = scope_of(&s, &alice).await;
  assert!(s.delete_course(alice_scope, course.course_id).await.unwrap());
  assert!(s.get_course(alice_scope, course.course_id).await.unwrap().is_none());
  assert!(!s.delete_course(alice_scope, course.course_id).await.unwrap());
}

#[tokio::test]
async fn slugs_are_unique_across_owners() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let subject = s.add_subject("Test Subject").await.unwrap();
  let course = s
    .create_course(draft(&alice, &subject, "Test Course", "test-course"))
    .await
    .unwrap();

  assert!(s.slug_in_use("test-course", None).await.unwrap());
  assert!(!s.slug_in_use("test-course", Some(course.course_id)).await.unwrap());
  assert!(!s.slug_in_use("free-slug", None).await.unwrap());

  let err = s
    .create_course(draft(&bob, &subject, "Copy", "test-course"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn course_with_unknown_subject_is_rejected() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let ghost = Subject {
    subject_id: Uuid::new_v4(),
    title:      "Ghost".into(),
    created_at: Utc::now(),
  };
  assert!(matches!(
    s.create_course(draft(&alice, &ghost, "Orphan", "orphan")).await,
    Err(Error::Conflict(_))
  ));
}
