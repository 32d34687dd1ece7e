#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use animal_sdk::api::{HttpRequest, HttpResponse, Transport};
use animal_sdk::cache::MemoryStorage;
use animal_sdk::{AnimalSdk, Config, Result};
use async_trait::async_trait;

pub const DOMAIN: &str = "http://localhost:3000/";

/// Answers by method and path (query string ignored). Routes can be replaced
/// between calls to simulate server-side edits.
#[derive(Default)]
pub struct FakeRails {
  routes: Mutex<HashMap<(String, String), (u16, String)>>,
  log: Mutex<Vec<HttpRequest>>,
}

impl FakeRails {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn route(&self, method: &str, path: &str, status: u16, body: &str) {
    self
      .routes
      .lock()
      .unwrap()
      .insert((method.to_string(), path.to_string()), (status, body.to_string()));
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.log.lock().unwrap().clone()
  }

  /// `METHOD path` per request, in execution order.
  pub fn calls(&self) -> Vec<String> {
    self
      .requests()
      .iter()
      .map(|r| format!("{} {}", r.method, path_of(&r.url)))
      .collect()
  }
}

fn path_of(url: &str) -> String {
  let rest = url.strip_prefix(DOMAIN.trim_end_matches('/')).unwrap_or(url);
  rest.split('?').next().unwrap_or(rest).to_string()
}

#[async_trait]
impl Transport for FakeRails {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
    let key = (request.method.to_string(), path_of(&request.url));
    self.log.lock().unwrap().push(request);
    let (status, body) = self
      .routes
      .lock()
      .unwrap()
      .get(&key)
      .cloned()
      .unwrap_or((404, r#"{"error": "not found"}"#.to_string()));
    Ok(HttpResponse {
      status,
      body: body.into_bytes(),
    })
  }
}

pub fn sdk(rails: Arc<FakeRails>) -> AnimalSdk {
  AnimalSdk::with_transport(
    Config::new(DOMAIN, "client-id", "client-secret"),
    rails,
    Arc::new(MemoryStorage::new()),
  )
}

/// Routes for the login and the animal fetch.
pub fn with_session(rails: &FakeRails) {
  rails.route("POST", "/oauth/token", 200, r#"{"access_token": "abc123", "created_at": 1}"#);
  rails.route(
    "GET",
    "/api/v1/animals/1",
    200,
    r#"{"id": 1, "name": "April", "conceived_on": "2016-04-15", "stream_url": "rtmp://x"}"#,
  );
}

pub fn authorization(request: &HttpRequest) -> Option<&str> {
  request
    .headers
    .iter()
    .find(|(name, _)| name == "Authorization")
    .map(|(_, value)| value.as_str())
}
