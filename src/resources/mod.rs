//! Resource accessors: thin parameterizations (path, sort, search, caching) over
//! the API client and the cache store.

mod animals;
mod menu_items;
mod months;
mod pages;
mod questions;

pub use animals::{Animals, CurrentAnimal};
pub use menu_items::MenuItems;
pub use months::{month_diff, Months};
pub use pages::Pages;
pub use questions::Questions;

use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::case::to_app_key;
use crate::api::{ApiClient, Endpoint, SuccessHook};
use crate::cache::{CacheEntry, CacheStore, Cacheable, Updatable};
use crate::error::Result;
use crate::models::{PagingInfo, PagingMeta, UrlParams};

/// Builds the URL path segment for a model, e.g. `animals/1/pages`.
pub type PathGenerator = Arc<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Builds the cache key for an identifier.
pub type KeyGenerator = Arc<dyn Fn(u64) -> String + Send + Sync>;

/// Side effect run with a fetched (or cached) item.
pub type ItemHook<M> = Box<dyn FnOnce(&M) + Send>;

/// Sort applied when a list call doesn't choose one.
pub const DEFAULT_SORT: &str = "created_at desc";

#[derive(Clone)]
pub struct ResourceOptions {
  /// Whether single fetches are cached and list fetches invalidate the cache
  pub cache: bool,
  pub default_sort: String,
  /// Path generator; defaults to the model name
  pub path: Option<PathGenerator>,
  /// Cache key generator; defaults to `{path}/{id}`
  pub key: Option<KeyGenerator>,
}

impl Default for ResourceOptions {
  fn default() -> Self {
    Self {
      cache: false,
      default_sort: DEFAULT_SORT.to_string(),
      path: None,
      key: None,
    }
  }
}

/// Resolves paths, URLs and cache keys for one model.
#[derive(Clone)]
struct Locator {
  client: ApiClient,
  model: String,
  path: Option<PathGenerator>,
  key: Option<KeyGenerator>,
}

impl Locator {
  fn path(&self) -> Result<String> {
    match &self.path {
      Some(generate) => generate(&self.model),
      None => Ok(self.model.clone()),
    }
  }

  fn url(&self, id: Option<u64>) -> Result<String> {
    Ok(self.client.build_url(&self.path()?, id, None))
  }

  fn key(&self, id: u64) -> Result<String> {
    match &self.key {
      Some(generate) => Ok(generate(id)),
      None => Ok(CacheStore::key(&self.path()?, id)),
    }
  }

  /// URL resolved when the call is admitted by the queue.
  fn endpoint(&self, id: Option<u64>) -> Endpoint {
    let locator = self.clone();
    Endpoint::deferred(move || locator.url(id))
  }
}

/// Typed access to one REST resource.
///
/// `M` is the full model returned by single fetches, `B` the list item model.
pub struct Resource<M, B> {
  client: ApiClient,
  cache: CacheStore,
  locator: Locator,
  options: ResourceOptions,
  _marker: PhantomData<fn() -> (M, B)>,
}

impl<M, B> Clone for Resource<M, B> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      cache: self.cache.clone(),
      locator: self.locator.clone(),
      options: self.options.clone(),
      _marker: PhantomData,
    }
  }
}

impl<M, B> Resource<M, B>
where
  M: Cacheable + Serialize + DeserializeOwned + Send + 'static,
  B: Cacheable + DeserializeOwned + Send + 'static,
{
  pub fn new(
    client: ApiClient,
    cache: CacheStore,
    model: impl Into<String>,
    options: ResourceOptions,
  ) -> Self {
    let locator = Locator {
      client: client.clone(),
      model: model.into(),
      path: options.path.clone(),
      key: options.key.clone(),
    };

    Self {
      client,
      cache,
      locator,
      options,
      _marker: PhantomData,
    }
  }

  pub fn model(&self) -> &str {
    &self.locator.model
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  pub fn options(&self) -> &ResourceOptions {
    &self.options
  }

  /// Fetch one page of the collection.
  ///
  /// Always goes to the network. With caching on, every returned item is checked
  /// against the cache and stale entries are invalidated. The request is queued
  /// before this returns.
  pub fn get_all(&self, mut params: UrlParams) -> BoxFuture<'static, Result<PagingInfo<B>>> {
    if params.sort.is_none() {
      params.sort = Some(self.options.default_sort.clone());
    }
    let query = match serde_json::to_value(&params) {
      Ok(query) => query,
      Err(e) => return future::ready(Err(e.into())).boxed(),
    };

    let handle = self.client.get(self.locator.endpoint(None), Some(query));
    let list_key = to_app_key(self.model());
    let cache = self.options.cache.then(|| self.cache.clone());
    let locator = self.locator.clone();

    async move {
      let json = handle.await?;

      let list = json.get(&list_key).cloned().unwrap_or(Value::Null);
      let items: Vec<B> = serde_json::from_value(list)?;
      let meta: PagingMeta = match json.get("meta") {
        Some(meta) if !meta.is_null() => serde_json::from_value(meta.clone())?,
        _ => PagingMeta::default(),
      };

      if let Some(cache) = cache {
        let updatables = items
          .iter()
          .filter_map(|item| {
            let updated_at = item.updated_at()?;
            Some(locator.key(item.id()).map(|key| Updatable::new(key, updated_at)))
          })
          .collect::<Result<Vec<_>>>()?;
        let invalidated = cache.process(&updatables)?;
        if invalidated > 0 {
          debug!(model = %locator.model, invalidated, "List response invalidated cached entries");
        }
      }

      Ok(PagingInfo { items, meta })
    }
    .boxed()
  }

  /// Fetch one item by identifier.
  pub fn get(&self, id: u64) -> BoxFuture<'static, Result<M>> {
    self.get_with(id, None)
  }

  /// Fetch one item, running `hook` with it before the result is returned.
  ///
  /// With caching on, a valid cached entry is returned without a network call. The
  /// request (if any) is queued before this returns.
  pub fn get_with(&self, id: u64, hook: Option<ItemHook<M>>) -> BoxFuture<'static, Result<M>> {
    // The key may depend on state only known once earlier queued calls ran.
    let key = if self.options.cache {
      self.locator.key(id).ok()
    } else {
      None
    };

    if let Some(key) = &key {
      match self.cache.get::<M>(key) {
        Ok(Some(entry)) if entry.is_valid() => {
          debug!(key = %key, "Returning cached item");
          if let Some(hook) = hook {
            hook(&entry.item);
          }
          return future::ready(Ok(entry.item)).boxed();
        }
        Ok(_) => {}
        Err(e) => warn!(key = %key, error = %e, "Unreadable cache entry, fetching"),
      }
    }

    debug!(model = %self.model(), id, "Fetching item");
    let on_success = self.store_hook(id, key, hook);
    let handle = self
      .client
      .call(self.locator.endpoint(Some(id)), Method::GET, None, Some(on_success));

    async move {
      let json = handle.await?;
      Ok(serde_json::from_value(json)?)
    }
    .boxed()
  }

  /// Runs inside the queue slot of a successful single fetch.
  fn store_hook(&self, id: u64, key: Option<String>, hook: Option<ItemHook<M>>) -> SuccessHook {
    let cache = self.options.cache.then(|| self.cache.clone());
    let locator = self.locator.clone();

    Box::new(move |json: &Value| {
      let item: M = match serde_json::from_value(json.clone()) {
        Ok(item) => item,
        // The caller sees the decode error when the handle settles.
        Err(_) => return,
      };
      if let Some(hook) = hook {
        hook(&item);
      }

      let Some(cache) = cache else {
        return;
      };
      let key = match key.map(Ok).unwrap_or_else(|| locator.key(id)) {
        Ok(key) => key,
        Err(e) => {
          warn!(id, error = %e, "Cannot resolve cache key");
          return;
        }
      };
      let updated_at = item.updated_at().unwrap_or_default().to_string();
      if let Err(e) = cache.set(&key, &CacheEntry::valid(item, updated_at)) {
        warn!(key = %key, error = %e, "Failed to cache item");
      }
    })
  }

  /// Queue a call against the collection URL.
  pub(crate) fn call_collection<T>(&self, method: Method, body: Value) -> BoxFuture<'static, Result<T>>
  where
    T: DeserializeOwned + Send + 'static,
  {
    self
      .client
      .call_as(self.locator.endpoint(None), method, Some(body), None)
      .boxed()
  }
}
