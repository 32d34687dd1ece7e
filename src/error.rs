//! Error types shared by the queue, the API client and the cache.

use serde_json::Value;
use thiserror::Error;

/// A non-2xx response, carrying the translated (camelCase) error body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
  pub status: u16,
  pub body: Value,
}

impl ApiError {
  /// 404s are surfaced like any other failure; callers may treat them as absence.
  pub fn is_not_found(&self) -> bool {
    self.status == 404
  }
}

impl std::fmt::Display for ApiError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_not_found() {
      write!(f, "not found (HTTP 404): {}", self.body)
    } else {
      write!(f, "HTTP {}: {}", self.status, self.body)
    }
  }
}

#[derive(Error, Debug)]
pub enum SdkError {
  #[error("Queue limit reached ({capacity} pending tasks)")]
  QueueFull { capacity: usize },

  #[error("Transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("API error: {0}")]
  Api(ApiError),

  #[error("JSON decoding error: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Queued operation panicked: {0}")]
  OperationPanicked(String),

  #[error("No Tokio runtime available to run queued tasks")]
  NoRuntime,

  #[error("Current animal is not known yet")]
  NoCurrentAnimal,

  #[error("Invalid response data: {0}")]
  InvalidData(String),

  #[error("Invalid endpoint: {0}")]
  Endpoint(String),

  #[error("Cache storage error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("Cache error: {0}")]
  Cache(String),

  #[error("Configuration error: {0}")]
  Config(String),
}

impl SdkError {
  /// The API error payload, if this is a classified HTTP failure.
  pub fn api(&self) -> Option<&ApiError> {
    match self {
      SdkError::Api(e) => Some(e),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.api().is_some_and(ApiError::is_not_found)
  }
}

pub type Result<T> = std::result::Result<T, SdkError>;
