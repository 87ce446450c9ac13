//! Case-insensitive text search over cached resource sets.

use super::types::{Project, User};

/// Something that can be matched against a free-text query.
pub trait Searchable {
  /// All searchable fields joined into one string.
  fn search_text(&self) -> String;
}

impl Searchable for User {
  fn search_text(&self) -> String {
    let optional = [
      self.email.as_deref(),
      self.info.as_deref(),
      self.unit.as_ref().map(|u| u.name.as_str()),
      self.role.as_ref().map(|r| r.name.as_str()),
      self.mobile_phone.as_deref(),
      self.work_phone.as_deref(),
    ];

    let mut parts = vec![self.firstname.clone(), self.lastname.clone(), self.full_name()];
    parts.extend(optional.into_iter().flatten().map(String::from));
    parts.push(self.tags.join(" "));
    parts.join(" ")
  }
}

impl Searchable for Project {
  fn search_text(&self) -> String {
    match &self.description {
      Some(description) => format!("{} {}", self.name, description),
      None => self.name.clone(),
    }
  }
}

/// Filter `items` by a case-insensitive substring match.
///
/// A blank query returns everything.
pub fn filter_by_query<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return items.to_vec();
  }

  items
    .iter()
    .filter(|item| item.search_text().to_lowercase().contains(&needle))
    .cloned()
    .collect()
}
