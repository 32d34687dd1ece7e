//! SDK entry point: one client, one cache and every resource accessor scoped to the
//! current animal.

use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{ApiClient, ReqwestTransport, Transport};
use crate::cache::{CacheStore, KeyValueStore, MemoryStorage, NoopStorage, SqliteStorage};
use crate::config::{CacheBackend, Config};
use crate::error::Result;
use crate::models::Animal;
use crate::queue::TaskQueue;
use crate::resources::{
  Animals, CurrentAnimal, MenuItems, Months, Pages, PathGenerator, Questions, Resource,
  ResourceOptions, DEFAULT_SORT,
};

/// The animal the SDK scopes itself to after connecting.
pub const DEFAULT_ANIMAL_ID: u64 = 1;

pub struct AnimalSdk {
  config: Config,
  client: ApiClient,
  current: CurrentAnimal,
  pub pages: Pages,
  pub months: Months,
  pub menu_items: MenuItems,
  pub questions: Questions,
  pub animals: Animals,
}

impl AnimalSdk {
  /// Build the SDK over HTTP with the cache backend named in `config`.
  pub fn new(config: Config) -> Result<Self> {
    let transport = Arc::new(ReqwestTransport::new()?);
    let storage = open_storage(&config)?;
    Ok(Self::with_transport(config, transport, storage))
  }

  pub fn with_transport(
    config: Config,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KeyValueStore>,
  ) -> Self {
    info!(domain = %config.domain, "Connecting to Animal API");

    let queue = TaskQueue::new(config.queue.capacity, config.queue.concurrency);
    let client = ApiClient::new(config.domain.clone(), config.api_version.clone(), queue, transport);
    let cache = CacheStore::new(storage);
    let current = CurrentAnimal::new();

    let nested = ResourceOptions {
      cache: true,
      default_sort: DEFAULT_SORT.to_string(),
      path: Some(animal_path(current.clone())),
      key: None,
    };

    let pages = Resource::new(client.clone(), cache.clone(), "pages", nested.clone());
    let menu_items = Resource::new(client.clone(), cache.clone(), "menu_items", nested.clone());
    let questions = Resource::new(client.clone(), cache.clone(), "questions", nested.clone());
    let months = Months::new(
      Resource::new(client.clone(), cache.clone(), "months", nested),
      current.clone(),
    );
    let animals = Animals::new(
      Resource::new(
        client.clone(),
        cache,
        "animals",
        ResourceOptions {
          cache: false,
          ..Default::default()
        },
      ),
      current.clone(),
    );

    Self {
      config,
      client,
      current,
      pages,
      months,
      menu_items,
      questions,
      animals,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  /// The current animal, if `connect` has fetched it.
  pub fn current_animal(&self) -> Option<Animal> {
    self.current.get()
  }

  /// Queue the login and the current-animal fetch.
  ///
  /// Both are queued before this returns, so calls made right after `connect` run
  /// authenticated and scoped without awaiting the returned future. The future
  /// settles with the current animal, or the first error.
  pub fn connect(&self) -> BoxFuture<'static, Result<Animal>> {
    let secret = match self.config.client_secret() {
      Ok(secret) => secret,
      Err(e) => return future::ready(Err(e)).boxed(),
    };

    info!("Logging in");
    let token_client = self.client.clone();
    let login = self.client.call(
      format!("{}/oauth/token", self.client.domain()),
      Method::POST,
      Some(json!({
        "clientId": self.config.credentials.client_id,
        "clientSecret": secret,
        "grantType": "client_credentials",
      })),
      Some(Box::new(move |json: &Value| match json["accessToken"].as_str() {
        Some(token) => token_client.set_access_token(token),
        None => warn!("Login response carried no access token"),
      })),
    );

    let animal = self
      .animals
      .get_with(DEFAULT_ANIMAL_ID, Some(self.current.capture()));

    async move {
      login.await?;
      let animal = animal.await?;
      info!(animal = %animal.name, "Connected");
      Ok(animal)
    }
    .boxed()
  }
}

/// `animals/{current animal id}/{model}`, resolved when the call executes.
fn animal_path(current: CurrentAnimal) -> PathGenerator {
  Arc::new(move |model: &str| Ok(format!("animals/{}/{}", current.id()?, model)))
}

fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
  Ok(match config.cache.backend {
    CacheBackend::Memory => Arc::new(MemoryStorage::new()),
    CacheBackend::Sqlite => {
      let path = match &config.cache.path {
        Some(path) => path.clone(),
        None => SqliteStorage::default_path()?,
      };
      info!(path = %path.display(), "Using SQLite cache");
      Arc::new(SqliteStorage::open(&path)?)
    }
    CacheBackend::Disabled => Arc::new(NoopStorage),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::SdkError;
  use crate::models::UrlParams;
  use crate::test_utils::{header, RecordingTransport, TEST_DOMAIN};

  const TOKEN: &str = r#"{"access_token": "t0k", "token_type": "bearer"}"#;
  const ANIMAL: &str = r#"{"id": 1, "name": "April", "conceived_on": "2016-04-15"}"#;

  fn sdk(transport: Arc<RecordingTransport>) -> AnimalSdk {
    AnimalSdk::with_transport(
      Config::new(TEST_DOMAIN, "client", "secret"),
      transport,
      Arc::new(MemoryStorage::new()),
    )
  }

  #[tokio::test]
  async fn test_connect_logs_in_then_fetches_animal() {
    let transport = RecordingTransport::replying(vec![(200, TOKEN), (200, ANIMAL)]);
    let sdk = sdk(transport.clone());

    let animal = sdk.connect().await.unwrap();
    assert_eq!(animal.name, "April");
    assert_eq!(sdk.current_animal(), Some(animal));
    assert!(sdk.client().is_authenticated());

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].url, "http://localhost:3000/oauth/token");
    let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(
      body,
      json!({ "client_id": "client", "client_secret": "secret", "grant_type": "client_credentials" })
    );

    assert_eq!(requests[1].url, "http://localhost:3000/api/v1/animals/1");
    assert_eq!(header(&requests[1], "Authorization"), Some("Bearer t0k"));
  }

  #[tokio::test]
  async fn test_nested_calls_queued_before_connect_settles() {
    let transport = RecordingTransport::replying(vec![
      (200, TOKEN),
      (200, ANIMAL),
      (200, r#"{"pages": [], "meta": {"page_count": 0, "page_size": 20}}"#),
    ]);
    let sdk = sdk(transport.clone());

    let connected = sdk.connect();
    let pages = sdk.pages.get_all_published(UrlParams::default());

    let (connected, pages) = tokio::join!(connected, pages);
    connected.unwrap();
    assert!(pages.unwrap().items.is_empty());

    let urls = transport.urls();
    assert!(urls[2].starts_with("http://localhost:3000/api/v1/animals/1/pages?"));
    assert_eq!(header(&transport.requests()[2], "Authorization"), Some("Bearer t0k"));
  }

  #[tokio::test]
  async fn test_nested_call_without_animal_fails() {
    let transport = RecordingTransport::replying(vec![]);
    let sdk = sdk(transport.clone());

    let err = sdk.menu_items.get(3).await.unwrap_err();
    assert!(matches!(err, SdkError::NoCurrentAnimal));
    assert!(transport.requests().is_empty());
  }

  #[tokio::test]
  async fn test_failed_login_fails_connect() {
    let transport = RecordingTransport::replying(vec![(401, r#"{"error": "invalid_client"}"#), (401, "{}")]);
    let sdk = sdk(transport);

    let err = sdk.connect().await.unwrap_err();
    assert_eq!(err.api().map(|e| e.status), Some(401));
    assert!(!sdk.client().is_authenticated());
  }

  #[test]
  fn test_open_storage_backends() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::new(TEST_DOMAIN, "client", "secret");
    config.cache.backend = CacheBackend::Sqlite;
    config.cache.path = Some(dir.path().join("nested").join("cache.db"));

    let storage = open_storage(&config).unwrap();
    storage.set("pages/1", "{}").unwrap();
    assert_eq!(storage.get("pages/1").unwrap().as_deref(), Some("{}"));

    config.cache.backend = CacheBackend::Disabled;
    let storage = open_storage(&config).unwrap();
    storage.set("pages/1", "{}").unwrap();
    assert_eq!(storage.get("pages/1").unwrap(), None);
  }
}
