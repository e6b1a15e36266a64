//! Course form: the raw submission and its cleaning rules.
//!
//! Cleaning here is purely syntactic. Checks that need storage (the subject
//! exists, the slug is free) are applied by the caller, which adds to the same
//! [`FormErrors`].

use std::collections::BTreeMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::course::{Course, CourseFields, MAX_SLUG_LEN, MAX_TITLE_LEN};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_SLUG: &str =
  "Enter a valid “slug” consisting of letters, numbers, underscores or hyphens.";
pub const INVALID_CHOICE: &str =
  "Select a valid choice. That choice is not one of the available choices.";
pub const SLUG_TAKEN: &str = "Course with this Slug already exists.";

/// A course submission exactly as received. It has no owner field; an `owner`
/// key sent by a client is dropped on deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CourseForm {
  #[serde(default)]
  pub subject:  String,
  #[serde(default)]
  pub title:    String,
  #[serde(default)]
  pub slug:     String,
  #[serde(default)]
  pub overview: String,
}

impl From<&Course> for CourseForm {
  fn from(c: &Course) -> Self {
    Self {
      subject:  c.subject_id.to_string(),
      title:    c.title.clone(),
      slug:     c.slug.clone(),
      overview: c.overview.clone(),
    }
  }
}

impl CourseForm {
  /// Validate and normalise the submission.
  pub fn clean(&self) -> Result<CourseFields, FormErrors> {
    let mut errors = FormErrors::default();

    let subject = self.subject.trim();
    let title = self.title.trim();
    let slug = self.slug.trim();
    let overview = self.overview.trim();

    let subject_id = if subject.is_empty() {
      errors.add("subject", REQUIRED);
      None
    } else {
      match Uuid::parse_str(subject) {
        Ok(id) => Some(id),
        Err(_) => {
          errors.add("subject", INVALID_CHOICE);
          None
        }
      }
    };

    if title.is_empty() {
      errors.add("title", REQUIRED);
    } else {
      check_max_len(&mut errors, "title", title, MAX_TITLE_LEN);
    }

    if slug.is_empty() {
      errors.add("slug", REQUIRED);
    } else {
      if !is_valid_slug(slug) {
        errors.add("slug", INVALID_SLUG);
      }
      check_max_len(&mut errors, "slug", slug, MAX_SLUG_LEN);
    }

    if overview.is_empty() {
      errors.add("overview", REQUIRED);
    }

    match subject_id {
      Some(subject_id) if errors.is_empty() => Ok(CourseFields {
        subject_id,
        title: title.to_owned(),
        slug: slug.to_owned(),
        overview: overview.to_owned(),
      }),
      _ => Err(errors),
    }
  }
}

fn check_max_len(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
  let len = value.chars().count();
  if len > max {
    errors.add(
      field,
      format!("Ensure this value has at most {max} characters (it has {len})."),
    );
  }
}

/// Letters, digits, underscores and hyphens only.
pub fn is_valid_slug(s: &str) -> bool {
  !s.is_empty()
    && s
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Validation messages keyed by field name, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    self.0.entry(field).or_default().push(message.into());
  }

  pub fn field(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn valid() -> CourseForm {
    CourseForm {
      subject:  Uuid::new_v4().to_string(),
      title:    "New Course".into(),
      slug:     "new-course".into(),
      overview: "New Overview".into(),
    }
  }

  #[test]
  fn valid_form_cleans() {
    let form = valid();
    let fields = form.clean().unwrap();
    assert_eq!(fields.title, "New Course");
    assert_eq!(fields.slug, "new-course");
    assert_eq!(fields.subject_id.to_string(), form.subject);
  }

  #[test]
  fn values_are_trimmed() {
    let form = CourseForm {
      title: "  Padded  ".into(),
      ..valid()
    };
    assert_eq!(form.clean().unwrap().title, "Padded");
  }

  #[test]
  fn empty_form_reports_every_field() {
    let errors = CourseForm::default().clean().unwrap_err();
    for field in ["subject", "title", "slug", "overview"] {
      assert_eq!(errors.field(field), [REQUIRED], "field {field}");
    }
  }

  #[test]
  fn whitespace_only_is_missing() {
    let form = CourseForm {
      overview: "   ".into(),
      ..valid()
    };
    assert_eq!(form.clean().unwrap_err().field("overview"), [REQUIRED]);
  }

  #[test]
  fn bad_slug_is_rejected() {
    let form = CourseForm {
      slug: "not a slug!".into(),
      ..valid()
    };
    let errors = form.clean().unwrap_err();
    assert_eq!(errors.field("slug"), [INVALID_SLUG]);
    assert!(errors.field("title").is_empty());
  }

  #[test]
  fn overlong_title_is_rejected() {
    let form = CourseForm {
      title: "x".repeat(201),
      ..valid()
    };
    assert_eq!(
      form.clean().unwrap_err().field("title"),
      ["Ensure this value has at most 200 characters (it has 201)."]
    );
  }

  #[test]
  fn non_uuid_subject_is_an_invalid_choice() {
    let form = CourseForm {
      subject: "42".into(),
      ..valid()
    };
    assert_eq!(form.clean().unwrap_err().field("subject"), [INVALID_CHOICE]);
  }
}
