//! Cache keys for MOCO queries.

use crate::cache::QueryKey;

/// Cacheable MOCO queries. Both cache the full unfiltered set; text search
/// runs in memory on top of it.
#[derive(Clone, Debug)]
pub enum MocoQueryKey {
  /// Projects assigned to the current user (one global entry)
  AssignedProjects,
  /// The user directory, optionally including archived users and filtered by tags
  Users {
    include_archived: bool,
    tags: Option<Vec<String>>,
  },
}

impl MocoQueryKey {
  pub fn users(include_archived: bool, tags: Option<&[String]>) -> Self {
    Self::Users {
      include_archived,
      tags: tags.map(<[String]>::to_vec),
    }
  }
}

impl QueryKey for MocoQueryKey {
  fn cache_key(&self) -> String {
    match self {
      Self::AssignedProjects => "projects:assigned".to_string(),
      Self::Users {
        include_archived,
        tags,
      } => {
        let tags = normalize_tags(tags.as_deref());
        let tags = if tags.is_empty() {
          "*".to_string()
        } else {
          tags.join(",")
        };
        format!("users:archived={}:tags={}", include_archived, tags)
      }
    }
  }

  fn description(&self) -> String {
    match self {
      Self::AssignedProjects => "assigned projects".to_string(),
      Self::Users {
        include_archived,
        tags,
      } => {
        let mut desc = if *include_archived {
          "all users".to_string()
        } else {
          "active users".to_string()
        };
        let tags = normalize_tags(tags.as_deref());
        if !tags.is_empty() {
          desc.push_str(&format!(" tagged {}", tags.join(", ")));
        }
        desc
      }
    }
  }
}

/// Trim, drop blanks, sort and deduplicate a tag filter.
///
/// `["b", "a"]`, `["a", "b", "a"]` and `[" a", "b"]` all normalize to `["a", "b"]`;
/// `None` and `[]` both normalize to `[]`.
pub fn normalize_tags(tags: Option<&[String]>) -> Vec<String> {
  let mut tags: Vec<String> = tags
    .unwrap_or_default()
    .iter()
    .map(|t| t.trim())
    .filter(|t| !t.is_empty())
    .map(String::from)
    .collect();
  tags.sort();
  tags.dedup();
  tags
}
