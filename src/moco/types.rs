//! MOCO resource records.
//!
//! These mirror the API's JSON shapes closely. Fields MOCO may omit or send
//! as null are optional or defaulted so partial responses still parse.

use serde::{Deserialize, Serialize};

/// Minimal user reference embedded in other resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
  pub id: u64,
  #[serde(default)]
  pub firstname: String,
  #[serde(default)]
  pub lastname: String,
}

/// Minimal `{ id, name }` reference (customer, unit, role, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
  pub id: u64,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityProject {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub billable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTask {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub billable: bool,
}

/// A time entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  pub id: u64,
  pub date: String,
  #[serde(default)]
  pub hours: f64,
  pub seconds: Option<u64>,
  pub description: Option<String>,
  #[serde(default)]
  pub billed: bool,
  #[serde(default)]
  pub billable: bool,
  pub tag: Option<String>,
  pub project: Option<ActivityProject>,
  pub task: Option<ActivityTask>,
  pub customer: Option<NamedRef>,
  pub user: Option<UserRef>,
  pub hourly_rate: Option<f64>,
  pub timer_started_at: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

/// A task of an assigned project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub active: bool,
  #[serde(default)]
  pub billable: bool,
}

/// The current user's contract on an assigned project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContract {
  pub user_id: u64,
  #[serde(default)]
  pub active: bool,
  pub budget: Option<f64>,
  pub hourly_rate: Option<f64>,
}

/// A project assigned to the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub id: u64,
  pub identifier: Option<String>,
  pub name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub active: bool,
  #[serde(default)]
  pub billable: bool,
  pub customer: Option<NamedRef>,
  #[serde(default)]
  pub tasks: Vec<Task>,
  pub contract: Option<ProjectContract>,
}

/// A member of the account's user directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  #[serde(default)]
  pub firstname: String,
  #[serde(default)]
  pub lastname: String,
  #[serde(default)]
  pub active: bool,
  #[serde(default, rename = "extern")]
  pub is_extern: bool,
  pub email: Option<String>,
  pub mobile_phone: Option<String>,
  pub work_phone: Option<String>,
  pub info: Option<String>,
  pub birthday: Option<String>,
  pub avatar_url: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  pub unit: Option<NamedRef>,
  pub role: Option<NamedRef>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

impl User {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.firstname, self.lastname)
  }
}

/// Yearly holiday entitlement of the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserHoliday {
  pub id: u64,
  pub year: i32,
  pub title: Option<String>,
  #[serde(default)]
  pub days: f64,
  #[serde(default)]
  pub hours: f64,
  pub user: Option<UserRef>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

/// A presence (clock-in/clock-out span)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPresence {
  pub id: u64,
  pub date: String,
  pub from: Option<String>,
  pub to: Option<String>,
  #[serde(default)]
  pub is_home_office: bool,
  pub user: Option<UserRef>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

/// What a schedule entry is assigned to (an absence or a project)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub code: Option<String>,
  pub customer_name: Option<String>,
  pub color: Option<String>,
}

/// A planned day or half-day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
  pub id: u64,
  pub date: String,
  pub comment: Option<String>,
  #[serde(default)]
  pub am: bool,
  #[serde(default)]
  pub pm: bool,
  pub symbol: Option<u32>,
  pub assignment: Option<ScheduleAssignment>,
  pub user: Option<UserRef>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

/// The absence categories derived from the schedule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceKind {
  PublicHoliday,
  SickDay,
  Holiday,
}

impl AbsenceKind {
  /// MOCO's fixed absence code
  pub fn code(self) -> &'static str {
    match self {
      Self::PublicHoliday => "2",
      Self::SickDay => "3",
      Self::Holiday => "4",
    }
  }

  /// Names MOCO uses for the absence, lowercased (English and German accounts)
  fn names(self) -> &'static [&'static str] {
    match self {
      Self::PublicHoliday => &["public holiday", "feiertag"],
      Self::SickDay => &["sick day", "sickness", "krankheit"],
      Self::Holiday => &["holiday", "vacation", "urlaub"],
    }
  }

  /// Whether a schedule entry records this kind of absence.
  ///
  /// The code decides when present; the name is only consulted without one.
  pub fn matches(self, schedule: &Schedule) -> bool {
    let Some(assignment) = &schedule.assignment else {
      return false;
    };

    if !assignment
      .kind
      .as_deref()
      .is_some_and(|kind| kind.eq_ignore_ascii_case("absence"))
    {
      return false;
    }

    match assignment.code.as_deref() {
      Some(code) => code == self.code(),
      None => self
        .names()
        .contains(&assignment.name.trim().to_lowercase().as_str()),
    }
  }
}
