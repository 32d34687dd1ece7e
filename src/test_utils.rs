//! Shared helpers for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{ApiClient, HttpRequest, HttpResponse, Transport, DEFAULT_API_VERSION};
use crate::error::Result;
use crate::queue::TaskQueue;

pub const TEST_DOMAIN: &str = "http://localhost:3000";

/// Replies with canned responses in order and records every request.
/// Once the canned replies run out it answers `200 {}`.
#[derive(Default)]
pub struct RecordingTransport {
  replies: Mutex<VecDeque<HttpResponse>>,
  requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
  pub fn replying(replies: Vec<(u16, &str)>) -> Arc<Self> {
    Arc::new(Self {
      replies: Mutex::new(
        replies
          .into_iter()
          .map(|(status, body)| HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
          })
          .collect(),
      ),
      requests: Mutex::new(Vec::new()),
    })
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn urls(&self) -> Vec<String> {
    self.requests().into_iter().map(|r| r.url).collect()
  }
}

#[async_trait]
impl Transport for RecordingTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
    self.requests.lock().unwrap().push(request);
    Ok(
      self
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(HttpResponse {
          status: 200,
          body: b"{}".to_vec(),
        }),
    )
  }
}

/// Serial client against `TEST_DOMAIN`.
pub fn test_client(transport: Arc<RecordingTransport>) -> ApiClient {
  ApiClient::new(
    TEST_DOMAIN,
    DEFAULT_API_VERSION,
    TaskQueue::new(None, 1),
    transport,
  )
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
  request
    .headers
    .iter()
    .find(|(n, _)| n == name)
    .map(|(_, v)| v.as_str())
}
