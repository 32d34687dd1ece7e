//! Animals and the current-animal handle shared by nested resources.

use std::sync::{Arc, RwLock};

use crate::error::{Result, SdkError};
use crate::models::Animal;
use crate::queue::TaskHandle;

use super::{ItemHook, Resource};

/// The animal the SDK is scoped to, captured once it has been fetched.
#[derive(Debug, Clone, Default)]
pub struct CurrentAnimal {
  inner: Arc<RwLock<Option<Animal>>>,
}

impl CurrentAnimal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self) -> Option<Animal> {
    self
      .inner
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  pub fn set(&self, animal: Animal) {
    let mut current = self
      .inner
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    *current = Some(animal);
  }

  /// Identifier of the current animal, or `NoCurrentAnimal` before it is known.
  pub fn id(&self) -> Result<u64> {
    self.get().map(|a| a.id).ok_or(SdkError::NoCurrentAnimal)
  }

  /// Hook that records a fetched animal as the current one.
  pub fn capture(&self) -> ItemHook<Animal> {
    let current = self.clone();
    Box::new(move |animal: &Animal| current.set(animal.clone()))
  }
}

/// Animals resource plus access to the current animal.
#[derive(Clone)]
pub struct Animals {
  resource: Resource<Animal, Animal>,
  current: CurrentAnimal,
}

impl Animals {
  pub fn new(resource: Resource<Animal, Animal>, current: CurrentAnimal) -> Self {
    Self { resource, current }
  }

  pub fn resource(&self) -> &Resource<Animal, Animal> {
    &self.resource
  }

  /// The current animal, resolved in queue order after any pending calls.
  pub fn current(&self) -> TaskHandle<Animal> {
    let current = self.current.clone();
    self
      .resource
      .client()
      .queue()
      .submit(move || async move { current.get().ok_or(SdkError::NoCurrentAnimal) })
  }
}

impl std::ops::Deref for Animals {
  type Target = Resource<Animal, Animal>;

  fn deref(&self) -> &Self::Target {
    &self.resource
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheStore, MemoryStorage};
  use crate::resources::ResourceOptions;
  use crate::test_utils::{test_client, RecordingTransport};

  const ANIMAL: &str = r#"{"id": 1, "name": "April", "conceived_on": "2016-04-15", "stream_url": null}"#;

  #[test]
  fn test_current_animal_unknown() {
    let current = CurrentAnimal::new();
    assert!(current.get().is_none());
    assert!(matches!(current.id(), Err(SdkError::NoCurrentAnimal)));
  }

  #[test]
  fn test_current_animal_survives_poisoned_lock() {
    let current = CurrentAnimal::new();
    current.set(Animal {
      id: 4,
      name: "April".into(),
      conceived_on: "2016-04-15".into(),
      stream_url: None,
    });

    let poisoner = current.clone();
    let result = std::thread::spawn(move || {
      let _animal = poisoner.inner.write().unwrap();
      panic!("poison the animal lock");
    })
    .join();
    assert!(result.is_err());

    assert_eq!(current.id().unwrap(), 4);
    assert_eq!(current.get().map(|a| a.name), Some("April".to_string()));
  }

  #[tokio::test]
  async fn test_current_resolves_after_capture() {
    let transport = RecordingTransport::replying(vec![(200, ANIMAL)]);
    let current = CurrentAnimal::new();
    let animals = Animals::new(
      Resource::new(
        test_client(transport.clone()),
        CacheStore::new(Arc::new(MemoryStorage::new())),
        "animals",
        ResourceOptions::default(),
      ),
      current.clone(),
    );

    let fetch = animals.get_with(1, Some(current.capture()));
    // Queued behind the fetch, so the capture has already happened.
    let resolved = animals.current();

    let fetched = fetch.await.unwrap();
    let resolved = resolved.await.unwrap();
    assert_eq!(fetched, resolved);
    assert_eq!(resolved.name, "April");
    assert_eq!(current.id().unwrap(), 1);
    assert_eq!(transport.urls(), vec!["http://localhost:3000/api/v1/animals/1"]);
  }
}
