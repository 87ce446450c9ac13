//! Core traits for the caching system.

/// A logical query whose result can be cached.
///
/// Implementors must produce the same key for semantically identical queries,
/// regardless of how the caller ordered its inputs.
pub trait QueryKey {
  /// Deterministic cache key for this query.
  fn cache_key(&self) -> String;

  /// Human-readable description for logs.
  fn description(&self) -> String;
}
