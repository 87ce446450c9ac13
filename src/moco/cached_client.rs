//! Cached MOCO client exposing the domain operations.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::cache::CacheLayer;
use crate::config::MocoConfig;
use crate::error::{MocoError, Result};

use super::cache::{normalize_tags, MocoQueryKey};
use super::client::MocoClient;
use super::search::filter_by_query;
use super::types::{
  AbsenceKind, Activity, Project, Schedule, Task, User, UserHoliday, UserPresence,
};

/// Filters for the user directory query.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
  pub include_archived: bool,
  pub tags: Option<Vec<String>>,
}

/// MOCO client with transparent caching.
///
/// Assigned projects and the user directory are cached as full sets and
/// filtered in memory; everything else goes straight to the API.
#[derive(Clone)]
pub struct CachedMocoClient {
  inner: MocoClient,
  projects: CacheLayer<Vec<Project>>,
  users: CacheLayer<Vec<User>>,
  cache_ttl_seconds: u64,
}

impl CachedMocoClient {
  pub fn new(config: &MocoConfig) -> Result<Self> {
    Ok(Self {
      inner: MocoClient::new(config)?,
      projects: CacheLayer::new(),
      users: CacheLayer::new(),
      cache_ttl_seconds: config.cache_ttl_seconds,
    })
  }

  /// Time entries between two dates (inclusive), optionally for one project.
  pub async fn get_activities(
    &self,
    start_date: &str,
    end_date: &str,
    project_id: Option<u64>,
  ) -> Result<Vec<Activity>> {
    validate_range(start_date, end_date)?;

    let mut params = vec![("from", start_date.to_string()), ("to", end_date.to_string())];
    if let Some(id) = project_id {
      params.push(("project_id", id.to_string()));
    }

    self.inner.get_all_pages("activities", &params).await
  }

  /// Projects assigned to the current user (cached).
  pub async fn get_projects(&self) -> Result<Vec<Project>> {
    let inner = self.inner.clone();

    self
      .projects
      .fetch(&MocoQueryKey::AssignedProjects, self.cache_ttl_seconds, move || async move {
        inner.get_all_pages("projects/assigned", &[]).await
      })
      .await
  }

  /// Assigned projects whose name or description contains `query`.
  pub async fn search_projects(&self, query: &str) -> Result<Vec<Project>> {
    let projects = self.get_projects().await?;
    Ok(filter_by_query(&projects, query))
  }

  /// Users matching `query`, from the cached directory for `filter`.
  pub async fn search_users(&self, query: &str, filter: &UserFilter) -> Result<Vec<User>> {
    let key = MocoQueryKey::users(filter.include_archived, filter.tags.as_deref());
    let include_archived = filter.include_archived;
    let tags = normalize_tags(filter.tags.as_deref());
    let inner = self.inner.clone();

    let users = self
      .users
      .fetch(&key, self.cache_ttl_seconds, move || async move {
        let mut params = Vec::new();
        if include_archived {
          params.push(("include_archived", "true".to_string()));
        }
        if !tags.is_empty() {
          params.push(("tags", tags.join(",")));
        }
        inner.get_all_pages("users", &params).await
      })
      .await?;

    Ok(filter_by_query(&users, query))
  }

  /// Tasks of an assigned project.
  ///
  /// Only projects the current user is assigned to are visible; any other id
  /// is rejected rather than looked up.
  pub async fn get_project_tasks(&self, project_id: u64) -> Result<Vec<Task>> {
    let projects = self.get_projects().await?;

    projects
      .into_iter()
      .find(|p| p.id == project_id)
      .map(|p| p.tasks)
      .ok_or(MocoError::ProjectNotAssigned(project_id))
  }

  /// Holiday entitlements for a year. A 404 means nothing is recorded yet.
  pub async fn get_user_holidays(&self, year: i32) -> Result<Vec<UserHoliday>> {
    validate_year(year)?;

    match self
      .inner
      .get_all_pages("users/holidays", &[("year", year.to_string())])
      .await
    {
      Err(e) if e.is_not_found() => {
        debug!(year, "no holiday entitlements recorded");
        Ok(Vec::new())
      }
      other => other,
    }
  }

  pub async fn get_taken_holidays(&self, year: i32) -> Result<Vec<Schedule>> {
    self.get_absences(year, AbsenceKind::Holiday).await
  }

  pub async fn get_taken_sick_days(&self, year: i32) -> Result<Vec<Schedule>> {
    self.get_absences(year, AbsenceKind::SickDay).await
  }

  pub async fn get_public_holidays(&self, year: i32) -> Result<Vec<Schedule>> {
    self.get_absences(year, AbsenceKind::PublicHoliday).await
  }

  /// Presences between two dates (inclusive).
  pub async fn get_user_presences(
    &self,
    start_date: &str,
    end_date: &str,
  ) -> Result<Vec<UserPresence>> {
    validate_range(start_date, end_date)?;

    self
      .inner
      .get_all_pages(
        "users/presences",
        &[("from", start_date.to_string()), ("to", end_date.to_string())],
      )
      .await
  }

  /// Forget every cached project and user set.
  pub fn invalidate_cache(&self) {
    self.projects.clear();
    self.users.clear();
  }

  /// Schedule entries of one absence kind for a year.
  ///
  /// These are read-only aggregate views: every failure, an out-of-range
  /// year included, degrades to an empty list instead of propagating.
  async fn get_absences(&self, year: i32, kind: AbsenceKind) -> Result<Vec<Schedule>> {
    if let Err(e) = validate_year(year) {
      warn!(year, ?kind, error = %e, "invalid year, returning no absences");
      return Ok(Vec::new());
    }

    let params = [
      ("from", format!("{}-01-01", year)),
      ("to", format!("{}-12-31", year)),
    ];

    match self.inner.get_all_pages::<Schedule>("schedules", &params).await {
      Ok(schedules) => Ok(schedules.into_iter().filter(|s| kind.matches(s)).collect()),
      Err(e) if e.is_not_found() => {
        debug!(year, ?kind, "no schedules recorded");
        Ok(Vec::new())
      }
      Err(e) => {
        warn!(year, ?kind, error = %e, "failed to load schedules, returning none");
        Ok(Vec::new())
      }
    }
  }
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
  let invalid = || {
    MocoError::InvalidParameter(format!(
      "{} must be a date in YYYY-MM-DD format, got {:?}",
      name, value
    ))
  };

  if value.len() != 10 {
    return Err(invalid());
  }
  NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn validate_range(start_date: &str, end_date: &str) -> Result<()> {
  let start = parse_date("start_date", start_date)?;
  let end = parse_date("end_date", end_date)?;

  if start > end {
    return Err(MocoError::InvalidParameter(format!(
      "start_date {} is after end_date {}",
      start_date, end_date
    )));
  }
  Ok(())
}

fn validate_year(year: i32) -> Result<()> {
  if !(2000..=2100).contains(&year) {
    return Err(MocoError::InvalidParameter(format!(
      "year must be between 2000 and 2100, got {}",
      year
    )));
  }
  Ok(())
}
