//! Rails API client.
//! Builds URLs, translates payloads between wire and application format, and runs
//! every HTTP exchange through the shared task queue.

use std::future::Future;
use std::sync::{Arc, RwLock};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::form_urlencoded;

use crate::error::{ApiError, Result, SdkError};
use crate::queue::{TaskHandle, TaskQueue};

use super::case::{to_app, to_wire, to_wire_key};
use super::transport::{HttpRequest, HttpResponse, Transport};

/// API version used when a call does not override it.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Side effect run with the translated body of a successful call, inside the
/// call's queue slot and before the caller's handle settles.
pub type SuccessHook = Box<dyn FnOnce(&Value) + Send>;

/// Where a call goes. A deferred URL is resolved when the task is admitted, so it
/// may depend on state that earlier queued calls establish.
pub enum Endpoint {
  Url(String),
  Deferred(Box<dyn FnOnce() -> Result<String> + Send>),
}

impl Endpoint {
  pub fn deferred<F>(f: F) -> Self
  where
    F: FnOnce() -> Result<String> + Send + 'static,
  {
    Endpoint::Deferred(Box::new(f))
  }

  fn resolve(self) -> Result<String> {
    match self {
      Endpoint::Url(url) => Ok(url),
      Endpoint::Deferred(f) => f(),
    }
  }
}

impl From<String> for Endpoint {
  fn from(url: String) -> Self {
    Endpoint::Url(url)
  }
}

impl From<&str> for Endpoint {
  fn from(url: &str) -> Self {
    Endpoint::Url(url.to_string())
  }
}

impl std::fmt::Debug for Endpoint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Endpoint::Url(url) => f.debug_tuple("Url").field(url).finish(),
      Endpoint::Deferred(_) => f.write_str("Deferred(..)"),
    }
  }
}

#[derive(Debug, Default)]
struct Session {
  access_token: Option<String>,
}

struct ClientInner {
  domain: String,
  api_version: String,
  session: RwLock<Session>,
  queue: TaskQueue,
  transport: Arc<dyn Transport>,
}

/// Client for a snake_case Rails API.
///
/// Clones share the session, the queue and the transport.
#[derive(Clone)]
pub struct ApiClient {
  inner: Arc<ClientInner>,
}

impl ApiClient {
  pub fn new(
    domain: impl Into<String>,
    api_version: impl Into<String>,
    queue: TaskQueue,
    transport: Arc<dyn Transport>,
  ) -> Self {
    let domain = domain.into().trim_end_matches('/').to_string();

    Self {
      inner: Arc::new(ClientInner {
        domain,
        api_version: api_version.into(),
        session: RwLock::new(Session::default()),
        queue,
        transport,
      }),
    }
  }

  /// Base domain without a trailing slash.
  pub fn domain(&self) -> &str {
    &self.inner.domain
  }

  /// The queue every call of this client goes through.
  pub fn queue(&self) -> &TaskQueue {
    &self.inner.queue
  }

  /// `{domain}/api/{version}/{resource}[/{id}]`
  pub fn build_url(&self, resource: &str, id: Option<u64>, api_version: Option<&str>) -> String {
    let version = api_version.unwrap_or(&self.inner.api_version);
    let base = format!("{}/api/{}", self.inner.domain, version);
    Self::build_resource(&base, resource, id)
  }

  /// `{base}/{resource}[/{id}]`, used for nested resources.
  pub fn build_resource(base: &str, resource: &str, id: Option<u64>) -> String {
    match id {
      Some(id) => format!("{}/{}/{}", base, resource, id),
      None => format!("{}/{}", base, resource),
    }
  }

  /// Store the bearer token; every call executed afterwards is authenticated.
  pub fn set_access_token(&self, token: impl Into<String>) {
    let mut session = self
      .inner
      .session
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    session.access_token = Some(token.into());
  }

  pub fn is_authenticated(&self) -> bool {
    self
      .inner
      .session
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .access_token
      .is_some()
  }

  /// Queue one HTTP exchange.
  ///
  /// `params` are in application format. For `GET` they become the query string,
  /// otherwise the JSON body. The handle resolves to the translated response body.
  pub fn call(
    &self,
    endpoint: impl Into<Endpoint>,
    method: Method,
    params: Option<Value>,
    on_success: Option<SuccessHook>,
  ) -> TaskHandle<Value> {
    let inner = Arc::clone(&self.inner);
    let endpoint = endpoint.into();
    self
      .inner
      .queue
      .submit(move || execute(inner, endpoint, method, params, on_success))
  }

  /// Queue a call and decode the translated body into `T`.
  pub fn call_as<T>(
    &self,
    endpoint: impl Into<Endpoint>,
    method: Method,
    params: Option<Value>,
    on_success: Option<SuccessHook>,
  ) -> impl Future<Output = Result<T>> + Send
  where
    T: DeserializeOwned,
  {
    let handle = self.call(endpoint, method, params, on_success);
    async move {
      let json = handle.await?;
      Ok(serde_json::from_value(json)?)
    }
  }

  pub fn get(&self, endpoint: impl Into<Endpoint>, params: Option<Value>) -> TaskHandle<Value> {
    self.call(endpoint, Method::GET, params, None)
  }

  pub fn post(&self, endpoint: impl Into<Endpoint>, body: Value) -> TaskHandle<Value> {
    self.call(endpoint, Method::POST, Some(body), None)
  }

  fn headers(&self) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];

    let session = self
      .inner
      .session
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(token) = &session.access_token {
      headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    }

    headers
  }
}

impl std::fmt::Debug for ApiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiClient")
      .field("domain", &self.inner.domain)
      .field("api_version", &self.inner.api_version)
      .field("authenticated", &self.is_authenticated())
      .field("queue", &self.inner.queue)
      .finish_non_exhaustive()
  }
}

/// Body of a queued call.
async fn execute(
  inner: Arc<ClientInner>,
  endpoint: Endpoint,
  method: Method,
  params: Option<Value>,
  on_success: Option<SuccessHook>,
) -> Result<Value> {
  let client = ApiClient { inner };
  let mut url = endpoint.resolve()?;

  let body = if method == Method::GET {
    if let Some(query) = params.as_ref().and_then(query_string) {
      url.push(if url.contains('?') { '&' } else { '?' });
      url.push_str(&query);
    }
    None
  } else {
    params.map(|p| to_wire(p).to_string())
  };

  debug!(method = %method, url = %url, "Calling API");
  let response = client
    .inner
    .transport
    .send(HttpRequest {
      method: method.clone(),
      url: url.clone(),
      headers: client.headers(),
      body,
    })
    .await?;

  let json = decode(&response)?;
  match response.status {
    200..=299 => {
      debug!(url = %url, status = response.status, "API success");
      if let Some(hook) = on_success {
        hook(&json);
      }
      Ok(json)
    }
    404 => {
      warn!(url = %url, body = %json, "API warning: not found");
      Err(SdkError::Api(ApiError {
        status: 404,
        body: json,
      }))
    }
    status => {
      error!(url = %url, status, body = %json, "API failure");
      Err(SdkError::Api(ApiError { status, body: json }))
    }
  }
}

/// Parse and translate a response body. An empty body is `null`.
fn decode(response: &HttpResponse) -> Result<Value> {
  if response.body.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Null);
  }
  let raw: Value = serde_json::from_slice(&response.body)?;
  Ok(to_app(raw))
}

/// Top-level params as a query string with wire-format keys, skipping falsy values.
fn query_string(params: &Value) -> Option<String> {
  let map = params.as_object()?;
  let mut serializer = form_urlencoded::Serializer::new(String::new());
  let mut any = false;

  for (key, value) in map {
    if is_falsy(value) {
      continue;
    }
    let text = match value {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    };
    serializer.append_pair(&to_wire_key(key), &text);
    any = true;
  }

  any.then(|| serializer.finish())
}

fn is_falsy(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::Bool(b) => !b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
    Value::String(s) => s.is_empty(),
    Value::Array(_) | Value::Object(_) => false,
  }
}
