//! Error types shared by the cache and the MOCO client.

use thiserror::Error;

/// Errors surfaced by MOCO operations.
///
/// `Clone` so a single failed fetch can be handed to every caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MocoError {
  /// Non-2xx response from the API
  #[error("{message} (HTTP {status} {status_text})")]
  Http {
    status: u16,
    status_text: String,
    message: String,
  },

  /// Connection, timeout or other transport failure
  #[error("Network error: {0}")]
  Network(String),

  /// Response body was not the JSON we expected
  #[error("Failed to parse MOCO response: {0}")]
  Parse(String),

  /// Task lookup on a project outside the user's assignments
  #[error("Project with ID {0} not found or not assigned to the current user")]
  ProjectNotAssigned(u64),

  #[error("Invalid parameter: {0}")]
  InvalidParameter(String),

  #[error("Configuration error: {0}")]
  Config(String),
}

impl MocoError {
  /// Build an HTTP error, classifying the status into a readable message.
  pub fn http(status: u16, status_text: impl Into<String>) -> Self {
    let status_text = status_text.into();
    Self::Http {
      message: classify_status(status, &status_text),
      status,
      status_text,
    }
  }

  /// Whether the upstream answered 404.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Http { status: 404, .. })
  }
}

impl From<reqwest::Error> for MocoError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      Self::Network(format!("Request to MOCO timed out: {}", e))
    } else if e.is_connect() {
      Self::Network(format!("Could not connect to MOCO: {}", e))
    } else {
      Self::Network(e.to_string())
    }
  }
}

/// Map an HTTP status to a human-readable description.
pub fn classify_status(status: u16, status_text: &str) -> String {
  match status {
    400 => "Bad request - check the query parameters".to_string(),
    401 => "Invalid API key - check MOCO_API_KEY".to_string(),
    403 => "Access forbidden - the API key lacks permission for this resource".to_string(),
    404 => "Resource not found".to_string(),
    422 => "Validation failed".to_string(),
    429 => "Rate limit exceeded - try again later".to_string(),
    500..=599 => format!("MOCO server error ({})", status),
    _ if status_text.is_empty() => format!("Unexpected response from MOCO ({})", status),
    _ => format!("Unexpected response from MOCO: {}", status_text),
  }
}

/// Convenience result type for the core.
pub type Result<T> = std::result::Result<T, MocoError>;
