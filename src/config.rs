use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_API_VERSION;
use crate::error::{Result, SdkError};

/// Environment variable consulted when the config file carries no client secret.
pub const CLIENT_SECRET_ENV: &str = "ANIMAL_SDK_CLIENT_SECRET";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Base domain of the Rails API, e.g. "http://localhost:3000/"
  pub domain: String,
  #[serde(default = "default_api_version")]
  pub api_version: String,
  pub credentials: Credentials,
  #[serde(default)]
  pub queue: QueueConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

fn default_api_version() -> String {
  DEFAULT_API_VERSION.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
  pub client_id: String,
  /// Falls back to ANIMAL_SDK_CLIENT_SECRET when absent
  pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
  /// Maximum pending tasks; unbounded when not set
  pub capacity: Option<usize>,
  #[serde(default = "default_concurrency")]
  pub concurrency: usize,
}

fn default_concurrency() -> usize {
  1
}

impl Default for QueueConfig {
  fn default() -> Self {
    Self {
      capacity: None,
      concurrency: default_concurrency(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// In-process map, lost on exit
  #[default]
  Memory,
  /// SQLite file, survives restarts
  Sqlite,
  /// Nothing is stored; every lookup misses
  #[serde(rename = "none")]
  Disabled,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub backend: CacheBackend,
  /// SQLite file (defaults to $XDG_DATA_HOME/animal-sdk/cache.db)
  pub path: Option<PathBuf>,
}

impl Config {
  /// Config for `domain` with defaults for everything but the credentials.
  pub fn new(domain: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
    Self {
      domain: domain.into(),
      api_version: default_api_version(),
      credentials: Credentials {
        client_id: client_id.into(),
        client_secret: Some(client_secret.into()),
      },
      queue: QueueConfig::default(),
      cache: CacheConfig::default(),
    }
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./animal-sdk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/animal-sdk/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(SdkError::Config(format!("Config file not found: {}", p.display())));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(SdkError::Config(
        "No configuration file found. Create one at ~/.config/animal-sdk/config.yaml".to_string(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("animal-sdk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("animal-sdk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  pub fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| SdkError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    Self::from_yaml(&contents)
      .map_err(|e| SdkError::Config(format!("Failed to parse config file {}: {}", path.display(), e)))
  }

  fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Client secret from the file, or from ANIMAL_SDK_CLIENT_SECRET.
  pub fn client_secret(&self) -> Result<String> {
    if let Some(secret) = &self.credentials.client_secret {
      return Ok(secret.clone());
    }
    std::env::var(CLIENT_SECRET_ENV).map_err(|_| {
      SdkError::Config(format!(
        "Client secret not found. Set credentials.client_secret or the {} environment variable.",
        CLIENT_SECRET_ENV
      ))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_minimal_config_defaults() {
    let config = Config::from_yaml(
      r#"
domain: "http://localhost:3000/"
credentials:
  client_id: abc
  client_secret: shh
"#,
    )
    .unwrap();

    assert_eq!(config.api_version, "v1");
    assert_eq!(config.queue.capacity, None);
    assert_eq!(config.queue.concurrency, 1);
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.client_secret().unwrap(), "shh");
  }

  #[test]
  fn test_full_config() {
    let config = Config::from_yaml(
      r#"
domain: "https://animals.example.com"
api_version: v2
credentials:
  client_id: abc
queue:
  capacity: 50
  concurrency: 4
cache:
  backend: sqlite
  path: /tmp/animal-cache.db
"#,
    )
    .unwrap();

    assert_eq!(config.api_version, "v2");
    assert_eq!(config.queue.capacity, Some(50));
    assert_eq!(config.queue.concurrency, 4);
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/animal-cache.db")));
    assert!(config.credentials.client_secret.is_none());
  }

  #[test]
  fn test_unknown_backend_rejected() {
    let result = Config::from_yaml(
      r#"
domain: x
credentials: { client_id: a }
cache: { backend: redis }
"#,
    );
    assert!(result.is_err());
  }

  #[test]
  fn test_load_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "domain: http://localhost:3000").unwrap();
    writeln!(file, "credentials:\n  client_id: id\n  client_secret: secret").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.domain, "http://localhost:3000");
    assert_eq!(config.credentials.client_id, "id");
  }

  #[test]
  fn test_missing_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
    assert!(matches!(err, SdkError::Config(msg) if msg.contains("not found")));
  }

  #[test]
  fn test_parse_error_names_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "domain: [unterminated").unwrap();

    let err = Config::load_from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
  }
}
