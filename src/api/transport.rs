//! HTTP transport seam.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

use crate::error::{Result, SdkError};

/// A fully prepared HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: String,
  pub headers: Vec<(String, String)>,
  pub body: Option<String>,
}

/// Raw HTTP response: status and undecoded body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// Performs one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self> {
    let client = Client::builder()
      .user_agent(concat!("animal-sdk/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(SdkError::Transport)?;

    Ok(Self { client })
  }

  /// Wrap an existing client, e.g. one with custom TLS or proxy settings.
  pub fn with_client(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
      let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| SdkError::Endpoint(format!("invalid header name {}: {}", name, e)))?;
      let value = HeaderValue::from_str(value)
        .map_err(|e| SdkError::Endpoint(format!("invalid header value for {}: {}", name, e)))?;
      headers.insert(name, value);
    }

    let mut builder = self
      .client
      .request(request.method, &request.url)
      .headers(headers);
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse { status, body })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_connection_failure_is_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = ReqwestTransport::new().unwrap();
    let result = transport
      .send(HttpRequest {
        method: Method::GET,
        url: format!("http://{}/api/v1/pages", addr),
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: None,
      })
      .await;

    assert!(matches!(result, Err(SdkError::Transport(_))));
  }

  #[tokio::test]
  async fn test_invalid_header_is_rejected_before_sending() {
    let transport = ReqwestTransport::new().unwrap();
    let result = transport
      .send(HttpRequest {
        method: Method::GET,
        url: "http://127.0.0.1:1/".into(),
        headers: vec![("Authorization".into(), "Bearer bad\nvalue".into())],
        body: None,
      })
      .await;

    assert!(matches!(result, Err(SdkError::Endpoint(_))));
  }
}
