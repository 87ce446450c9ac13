use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Cache TTL used when neither the file nor the environment sets one
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub moco: MocoSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MocoSettings {
  /// Account subdomain, e.g. "acme" for acme.mocoapp.com
  pub subdomain: Option<String>,
  /// Full API base URL; takes precedence over `subdomain`
  pub base_url: Option<String>,
  /// Seconds to cache projects and users; 0 disables caching
  pub cache_ttl_seconds: Option<u64>,
}

/// Fully resolved settings for one client. Read-only once built.
#[derive(Debug, Clone)]
pub struct MocoConfig {
  pub api_key: String,
  pub base_url: String,
  pub cache_ttl_seconds: u64,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./moco.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/moco/config.yaml
  ///
  /// Having no file at all is fine; everything can come from the environment.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("moco.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("moco").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Combine file settings with environment overrides.
  ///
  /// Environment variables win over the file:
  /// - `MOCO_API_KEY` (required, never read from the file)
  /// - `MOCO_BASE_URL`, `MOCO_SUBDOMAIN`
  /// - `MOCO_CACHE_TTL_SECONDS`
  pub fn resolve(&self) -> Result<MocoConfig> {
    let api_key = Self::get_api_key()?;

    let base_url = env_var("MOCO_BASE_URL").or_else(|| self.moco.base_url.clone());
    let subdomain = env_var("MOCO_SUBDOMAIN").or_else(|| self.moco.subdomain.clone());
    let base_url = match (base_url, subdomain) {
      (Some(url), _) => url,
      (None, Some(sub)) => format!("https://{}.mocoapp.com/api/v1", sub.trim()),
      (None, None) => {
        return Err(eyre!(
          "MOCO account not configured. Set MOCO_SUBDOMAIN (or MOCO_BASE_URL), \
           or add moco.subdomain to the config file."
        ))
      }
    };

    let cache_ttl_seconds = match env_var("MOCO_CACHE_TTL_SECONDS") {
      Some(v) => v
        .parse()
        .map_err(|_| eyre!("MOCO_CACHE_TTL_SECONDS must be a non-negative integer, got {:?}", v))?,
      None => self
        .moco
        .cache_ttl_seconds
        .unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
    };

    Ok(MocoConfig {
      api_key,
      base_url: base_url.trim().trim_end_matches('/').to_string(),
      cache_ttl_seconds,
    })
  }

  /// Get the MOCO API key from the environment.
  pub fn get_api_key() -> Result<String> {
    env_var("MOCO_API_KEY")
      .ok_or_else(|| eyre!("MOCO API key not found. Set the MOCO_API_KEY environment variable."))
  }
}

/// Read an environment variable, treating blank values as unset.
fn env_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const VARS: [&str; 4] = [
    "MOCO_API_KEY",
    "MOCO_BASE_URL",
    "MOCO_SUBDOMAIN",
    "MOCO_CACHE_TTL_SECONDS",
  ];

  fn with_env<F: FnOnce()>(values: &[(&str, &str)], f: F) {
    let vars: Vec<(&str, Option<&str>)> = VARS
      .iter()
      .map(|name| {
        let value = values.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
        (*name, value)
      })
      .collect();
    temp_env::with_vars(vars, f);
  }

  #[test]
  fn test_subdomain_builds_base_url() {
    with_env(&[("MOCO_API_KEY", "secret"), ("MOCO_SUBDOMAIN", "acme")], || {
      let resolved = Config::default().resolve().unwrap();
      assert_eq!(resolved.base_url, "https://acme.mocoapp.com/api/v1");
      assert_eq!(resolved.api_key, "secret");
      assert_eq!(resolved.cache_ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
    });
  }

  #[test]
  fn test_base_url_wins_and_is_trimmed() {
    with_env(
      &[
        ("MOCO_API_KEY", "secret"),
        ("MOCO_SUBDOMAIN", "acme"),
        ("MOCO_BASE_URL", "http://localhost:9000/api/v1/"),
      ],
      || {
        let resolved = Config::default().resolve().unwrap();
        assert_eq!(resolved.base_url, "http://localhost:9000/api/v1");
      },
    );
  }

  #[test]
  fn test_missing_api_key_is_an_error() {
    with_env(&[("MOCO_SUBDOMAIN", "acme")], || {
      let err = Config::default().resolve().unwrap_err();
      assert!(err.to_string().contains("MOCO_API_KEY"));
    });
  }

  #[test]
  fn test_missing_account_is_an_error() {
    with_env(&[("MOCO_API_KEY", "secret")], || {
      assert!(Config::default().resolve().is_err());
    });
  }

  #[test]
  fn test_invalid_ttl_is_rejected() {
    with_env(
      &[
        ("MOCO_API_KEY", "secret"),
        ("MOCO_SUBDOMAIN", "acme"),
        ("MOCO_CACHE_TTL_SECONDS", "-5"),
      ],
      || {
        assert!(Config::default().resolve().is_err());
      },
    );
  }

  #[test]
  fn test_file_settings_with_env_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
      file,
      "moco:\n  subdomain: fromfile\n  cache_ttl_seconds: 60"
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.moco.subdomain.as_deref(), Some("fromfile"));

    with_env(&[("MOCO_API_KEY", "secret")], || {
      let resolved = config.resolve().unwrap();
      assert_eq!(resolved.base_url, "https://fromfile.mocoapp.com/api/v1");
      assert_eq!(resolved.cache_ttl_seconds, 60);
    });

    with_env(
      &[("MOCO_API_KEY", "secret"), ("MOCO_CACHE_TTL_SECONDS", "0")],
      || {
        assert_eq!(config.resolve().unwrap().cache_ttl_seconds, 0);
      },
    );
  }

  #[test]
  fn test_explicit_missing_file_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/moco.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
