//! HTML page generation.
//!
//! Pages are written with `quick-xml`'s writer API, which escapes every text
//! node and attribute value, so user-supplied titles and overviews can be
//! emitted directly.

use std::io::{self, Cursor};

use educa_core::{
  course::Course,
  form::{CourseForm, FormErrors},
  subject::Subject,
};
use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::paths;

type Attrs<'a> = &'a [(&'a str, &'a str)];

// ─── Page builder ────────────────────────────────────────────────────────────

/// An HTML document under construction, already inside `<body>`.
pub struct Page {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl Page {
  /// Write the document head and the site header. `user` is the signed-in
  /// username, if any; it gets a logout button.
  pub fn begin(title: &str, user: Option<&str>) -> io::Result<Self> {
    let mut page = Self {
      writer: Writer::new(Cursor::new(Vec::new())),
    };
    page
      .writer
      .write_event(Event::DocType(BytesText::from_escaped("html")))?;
    page.start("html", &[("lang", "en")])?;
    page.start("head", &[])?;
    page.empty("meta", &[("charset", "utf-8")])?;
    page.text_elem("title", &[], &format!("{title} | Educa"))?;
    page.end("head")?;
    page.start("body", &[])?;

    page.start("header", &[])?;
    page.text_elem("a", &[("class", "logo"), ("href", paths::COURSE_LIST)], "Educa")?;
    if let Some(username) = user {
      page.start("form", &[("method", "post"), ("action", paths::LOGOUT)])?;
      page.text_elem("span", &[("class", "user")], &format!("Signed in as {username}"))?;
      page.empty("input", &[("type", "submit"), ("value", "Sign out")])?;
      page.end("form")?;
    }
    page.end("header")?;

    page.start("main", &[])?;
    Ok(page)
  }

  pub fn finish(mut self) -> io::Result<String> {
    self.end("main")?;
    self.end("body")?;
    self.end("html")?;
    String::from_utf8(self.writer.into_inner().into_inner())
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
  }

  fn start(&mut self, tag: &str, attrs: Attrs<'_>) -> io::Result<()> {
    let mut el = BytesStart::new(tag);
    for (k, v) in attrs {
      el.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Start(el))
  }

  fn end(&mut self, tag: &str) -> io::Result<()> {
    self.writer.write_event(Event::End(BytesEnd::new(tag)))
  }

  fn text(&mut self, text: &str) -> io::Result<()> {
    self.writer.write_event(Event::Text(BytesText::new(text)))
  }

  fn text_elem(&mut self, tag: &str, attrs: Attrs<'_>, text: &str) -> io::Result<()> {
    self.start(tag, attrs)?;
    self.text(text)?;
    self.end(tag)
  }

  fn empty(&mut self, tag: &str, attrs: Attrs<'_>) -> io::Result<()> {
    let mut el = BytesStart::new(tag);
    for (k, v) in attrs {
      el.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Empty(el))
  }

  fn error_list(&mut self, messages: &[String]) -> io::Result<()> {
    if messages.is_empty() {
      return Ok(());
    }
    self.start("ul", &[("class", "errorlist")])?;
    for message in messages {
      self.text_elem("li", &[], message)?;
    }
    self.end("ul")
  }
}

// ─── Course pages ────────────────────────────────────────────────────────────

/// `GET /course/mine/`
pub fn course_list(
  username: &str,
  courses: &[Course],
  subjects: &[Subject],
) -> io::Result<String> {
  let mut page = Page::begin("My courses", Some(username))?;
  page.text_elem("h1", &[], "My courses")?;

  page.start("div", &[("class", "module")])?;
  for course in courses {
    let subject = subjects
      .iter()
      .find(|s| s.subject_id == course.subject_id)
      .map(|s| s.title.as_str())
      .unwrap_or("");
    let edit = paths::course_edit(course.course_id);
    let delete = paths::course_delete(course.course_id);

    page.start("div", &[("class", "course-info")])?;
    page.text_elem("h3", &[], &course.title)?;
    page.text_elem("p", &[("class", "subject")], subject)?;
    page.start("p", &[])?;
    page.text_elem("a", &[("href", edit.as_str())], "Edit")?;
    page.text(" ")?;
    page.text_elem("a", &[("href", delete.as_str())], "Delete")?;
    page.end("p")?;
    page.end("div")?;
  }
  if courses.is_empty() {
    page.text_elem("p", &[], "You have not created any courses yet.")?;
  }
  page.start("p", &[])?;
  page.text_elem(
    "a",
    &[("class", "button"), ("href", paths::COURSE_CREATE)],
    "Create new course",
  )?;
  page.end("p")?;
  page.end("div")?;

  page.finish()
}

/// The create/update form. `action` is the URL the form posts back to.
pub fn course_form(
  username: &str,
  heading: &str,
  action: &str,
  form: &CourseForm,
  errors: &FormErrors,
  subjects: &[Subject],
) -> io::Result<String> {
  let mut page = Page::begin(heading, Some(username))?;
  page.text_elem("h1", &[], heading)?;

  page.start("div", &[("class", "module")])?;
  page.text_elem("h2", &[], "Course info")?;
  page.start("form", &[("method", "post"), ("action", action)])?;

  // Subject
  page.start("p", &[])?;
  page.text_elem("label", &[("for", "id_subject")], "Subject:")?;
  page.error_list(errors.field("subject"))?;
  page.start("select", &[("name", "subject"), ("id", "id_subject")])?;
  page.text_elem("option", &[("value", "")], "---------")?;
  for subject in subjects {
    let id = subject.subject_id.to_string();
    if form.subject.trim() == id {
      page.text_elem(
        "option",
        &[("value", id.as_str()), ("selected", "selected")],
        &subject.title,
      )?;
    } else {
      page.text_elem("option", &[("value", id.as_str())], &subject.title)?;
    }
  }
  page.end("select")?;
  page.end("p")?;

  // Title, slug
  for (name, label, value) in [
    ("title", "Title:", form.title.as_str()),
    ("slug", "Slug:", form.slug.as_str()),
  ] {
    let id = format!("id_{name}");
    page.start("p", &[])?;
    page.text_elem("label", &[("for", id.as_str())], label)?;
    page.error_list(errors.field(name))?;
    page.empty(
      "input",
      &[
        ("type", "text"),
        ("name", name),
        ("id", id.as_str()),
        ("maxlength", "200"),
        ("value", value),
      ],
    )?;
    page.end("p")?;
  }

  // Overview
  page.start("p", &[])?;
  page.text_elem("label", &[("for", "id_overview")], "Overview:")?;
  page.error_list(errors.field("overview"))?;
  page.text_elem(
    "textarea",
    &[("name", "overview"), ("id", "id_overview"), ("rows", "10")],
    &form.overview,
  )?;
  page.end("p")?;

  page.empty("input", &[("type", "submit"), ("value", "Save course")])?;
  page.end("form")?;
  page.end("div")?;

  page.finish()
}

/// `GET /course/{id}/delete/`
pub fn course_delete(username: &str, course: &Course) -> io::Result<String> {
  let heading = format!("Delete course “{}”", course.title);
  let mut page = Page::begin(&heading, Some(username))?;
  page.text_elem("h1", &[], &heading)?;

  let action = paths::course_delete(course.course_id);
  page.start("div", &[("class", "module")])?;
  page.start("form", &[("method", "post"), ("action", action.as_str())])?;
  page.text_elem(
    "p",
    &[],
    &format!("Are you sure you want to delete “{}”?", course.title),
  )?;
  page.empty("input", &[("type", "submit"), ("value", "Confirm")])?;
  page.end("form")?;
  page.end("div")?;

  page.finish()
}

// ─── Account pages ───────────────────────────────────────────────────────────

/// `GET /accounts/login/`, and the re-rendered form after a failed attempt.
pub fn login(username: &str, next: &str, error: Option<&str>) -> io::Result<String> {
  let mut page = Page::begin("Log-in", None)?;
  page.text_elem("h1", &[], "Log-in")?;

  page.start("div", &[("class", "module")])?;
  if let Some(message) = error {
    page.text_elem("p", &[("class", "errornote")], message)?;
  } else {
    page.text_elem("p", &[], "Please, use the following form to log-in:")?;
  }

  page.start("form", &[("method", "post"), ("action", paths::LOGIN)])?;
  page.start("p", &[])?;
  page.text_elem("label", &[("for", "id_username")], "Username:")?;
  page.empty(
    "input",
    &[
      ("type", "text"),
      ("name", "username"),
      ("id", "id_username"),
      ("value", username),
    ],
  )?;
  page.end("p")?;
  page.start("p", &[])?;
  page.text_elem("label", &[("for", "id_password")], "Password:")?;
  page.empty(
    "input",
    &[("type", "password"), ("name", "password"), ("id", "id_password")],
  )?;
  page.end("p")?;
  page.empty("input", &[("type", "hidden"), ("name", "next"), ("value", next)])?;
  page.empty("input", &[("type", "submit"), ("value", "Log-in")])?;
  page.end("form")?;
  page.end("div")?;

  page.finish()
}

/// Minimal body for 403/404 responses.
pub fn status_page(code: u16, reason: &str) -> io::Result<String> {
  let heading = format!("{code} {reason}");
  let mut page = Page::begin(&heading, None)?;
  page.text_elem("h1", &[], &heading)?;
  page.finish()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn subject(title: &str) -> Subject {
    Subject {
      subject_id: Uuid::new_v4(),
      title:      title.into(),
      created_at: Utc::now(),
    }
  }

  fn course(title: &str, subject: &Subject) -> Course {
    Course {
      course_id:  Uuid::new_v4(),
      owner_id:   Uuid::new_v4(),
      subject_id: subject.subject_id,
      title:      title.into(),
      slug:       "slug".into(),
      overview:   "overview".into(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn list_links_to_edit_and_delete() {
    let s = subject("Test Subject");
    let c = course("Test Course", &s);
    let body = course_list("testuser", &[c.clone()], &[s]).unwrap();
    assert!(body.starts_with("<!DOCTYPE html>"), "{body}");
    assert!(body.contains("Test Course"));
    assert!(body.contains("Test Subject"));
    assert!(body.contains(&paths::course_edit(c.course_id)));
    assert!(body.contains(&paths::course_delete(c.course_id)));
    assert!(body.contains("Signed in as testuser"));
  }

  #[test]
  fn empty_list_says_so() {
    let body = course_list("testuser", &[], &[]).unwrap();
    assert!(body.contains("You have not created any courses yet."));
  }

  #[test]
  fn titles_are_escaped() {
    let s = subject("Test Subject");
    let c = course("<script>alert(1)</script>", &s);
    let body = course_list("testuser", &[c], &[s]).unwrap();
    assert!(!body.contains("<script>"), "{body}");
    assert!(body.contains("&lt;script&gt;"));
  }

  #[test]
  fn form_keeps_input_and_marks_selected_subject() {
    let a = subject("Algebra");
    let b = subject("Biology");
    let form = CourseForm {
      subject:  b.subject_id.to_string(),
      title:    "Cells".into(),
      slug:     "".into(),
      overview: "All about cells".into(),
    };
    let mut errors = FormErrors::default();
    errors.add("slug", "This field is required.");

    let body = course_form(
      "testuser",
      "Create a new course",
      paths::COURSE_CREATE,
      &form,
      &errors,
      &[a.clone(), b.clone()],
    )
    .unwrap();

    assert!(body.contains(r#"value="Cells""#), "{body}");
    assert!(body.contains("All about cells"));
    assert!(body.contains("This field is required."));
    assert!(body.contains(&format!(
      r#"value="{}" selected="selected""#,
      b.subject_id
    )));
    assert!(!body.contains(&format!(
      r#"value="{}" selected="selected""#,
      a.subject_id
    )));
  }

  #[test]
  fn delete_page_posts_back_to_itself() {
    let s = subject("Test Subject");
    let c = course("Test Course", &s);
    let body = course_delete("testuser", &c).unwrap();
    assert!(body.contains(&format!(
      r#"action="{}""#,
      paths::course_delete(c.course_id)
    )));
    assert!(body.contains("Are you sure you want to delete"));
  }

  #[test]
  fn login_carries_next() {
    let body = login("", "/course/mine/", None).unwrap();
    assert!(body.contains(r#"name="next" value="/course/mine/""#), "{body}");
    assert!(!body.contains("Signed in as"));
  }
}
