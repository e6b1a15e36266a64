//! Capability tokens: a closed set of `Action × Entity` pairs.
//!
//! A permission has a short codename (`view_course`) and a qualified name
//! carrying the application label (`courses.view_course`). Both forms parse.

use std::{collections::BTreeSet, fmt, str::FromStr};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::Error;

/// Application label prefixed to qualified permission names.
pub const APP_LABEL: &str = "courses";

/// What the principal wants to do.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  View,
  Add,
  Change,
  Delete,
}

/// The entity type an action applies to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  Course,
  Subject,
}

// ─── Permission ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
  pub action: Action,
  pub entity: Entity,
}

impl Permission {
  pub const fn new(action: Action, entity: Entity) -> Self {
    Self { action, entity }
  }

  pub const fn course(action: Action) -> Self {
    Self::new(action, Entity::Course)
  }

  pub const VIEW_COURSE: Self = Self::course(Action::View);
  pub const ADD_COURSE: Self = Self::course(Action::Add);
  pub const CHANGE_COURSE: Self = Self::course(Action::Change);
  pub const DELETE_COURSE: Self = Self::course(Action::Delete);

  /// The codename, e.g. `view_course`.
  pub fn codename(&self) -> String { format!("{}_{}", self.action, self.entity) }

  /// The codename prefixed with the application label, e.g.
  /// `courses.view_course`.
  pub fn qualified(&self) -> String {
    format!("{APP_LABEL}.{}", self.codename())
  }

  /// Every permission defined for `entity`, in action order.
  pub fn all_for(entity: Entity) -> impl Iterator<Item = Permission> {
    Action::iter().map(move |action| Permission::new(action, entity))
  }
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.action, self.entity)
  }
}

impl FromStr for Permission {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let unknown = || Error::UnknownPermission(s.to_owned());

    let codename = match s.split_once('.') {
      Some((APP_LABEL, rest)) => rest,
      Some(_) => return Err(unknown()),
      None => s,
    };
    let (action, entity) = codename.split_once('_').ok_or_else(unknown)?;

    Ok(Self {
      action: action.parse().map_err(|_| unknown())?,
      entity: entity.parse().map_err(|_| unknown())?,
    })
  }
}

// ─── PermissionSet ───────────────────────────────────────────────────────────

/// The explicit set of capabilities granted to a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
  pub fn new() -> Self { Self::default() }

  pub fn contains(&self, permission: Permission) -> bool {
    self.0.contains(&permission)
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<Permission> for PermissionSet {
  fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codename_and_qualified_forms() {
    assert_eq!(Permission::VIEW_COURSE.codename(), "view_course");
    assert_eq!(Permission::DELETE_COURSE.qualified(), "courses.delete_course");
    assert_eq!(
      Permission::new(Action::Change, Entity::Subject).to_string(),
      "change_subject"
    );
  }

  #[test]
  fn parses_both_forms() {
    let short: Permission = "add_course".parse().unwrap();
    let long: Permission = "courses.add_course".parse().unwrap();
    assert_eq!(short, Permission::ADD_COURSE);
    assert_eq!(long, Permission::ADD_COURSE);
  }

  #[test]
  fn rejects_unknown_permissions() {
    for raw in ["publish_course", "view_lesson", "other.view_course", "view", ""] {
      assert!(
        matches!(raw.parse::<Permission>(), Err(Error::UnknownPermission(_))),
        "{raw:?} should not parse"
      );
    }
  }

  #[test]
  fn all_for_course_yields_four_actions() {
    let all: PermissionSet = Permission::all_for(Entity::Course).collect();
    assert_eq!(all.len(), 4);
    assert!(all.contains(Permission::VIEW_COURSE));
    assert!(all.contains(Permission::ADD_COURSE));
    assert!(all.contains(Permission::CHANGE_COURSE));
    assert!(all.contains(Permission::DELETE_COURSE));
  }
}
