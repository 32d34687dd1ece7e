//! Domain types, decoded from responses after wire-to-application key translation.

use serde::{Deserialize, Serialize};

use crate::cache::Cacheable;

/// Animal the SDK is scoped to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
  pub id: u64,
  pub name: String,
  /// Date the pregnancy started (YYYY-MM-DD)
  pub conceived_on: String,
  #[serde(default)]
  pub stream_url: Option<String>,
}

/// Image attached to a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageImage {
  pub id: u64,
  pub url: String,
  pub filename: String,
}

/// Page as returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicPage {
  pub id: u64,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub body: Option<String>,
  /// "log" or "month"
  pub page_type: String,
  #[serde(default)]
  pub image_urls: Vec<PageImage>,
  pub created_at: String,
  pub updated_at: String,
}

/// Full page details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
  #[serde(flatten)]
  pub basic: BasicPage,
  /// "draft" or "published"
  pub status: String,
  #[serde(default)]
  pub video_url: Option<String>,
  #[serde(default)]
  pub more_info_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: u64,
  pub name: String,
  pub email: String,
  pub text: String,
  /// "asked" or "answered"
  pub status: String,
  #[serde(default)]
  pub response: Option<String>,
  #[serde(default)]
  pub responded_by_id: Option<u64>,
  pub created_at: String,
  pub updated_at: String,
}

/// Payload for asking a new question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestion {
  pub name: String,
  pub email: String,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
  pub id: u64,
  /// Page this menu item links to
  pub page_id: u64,
  /// Position in the side bar
  pub position: i64,
  pub name: String,
  #[serde(default)]
  pub updated_at: Option<String>,
}

/// Month as returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicMonth {
  pub id: u64,
  pub number: u32,
  pub page: BasicPage,
  /// Latest update of either the month or its page
  pub updated_at: String,
}

/// Full month details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Month {
  #[serde(flatten)]
  pub basic: BasicMonth,
  /// Overrides the page title
  pub name: String,
  pub animal_id: u64,
}

/// Pagination info from the `meta` object of list responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingMeta {
  #[serde(default)]
  pub page_count: u32,
  #[serde(default)]
  pub page_size: u32,
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct PagingInfo<T> {
  pub items: Vec<T>,
  pub meta: PagingMeta,
}

/// List query parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlParams {
  pub page_num: Option<u32>,
  pub page_size: Option<u32>,
  pub search: Option<String>,
  pub sort: Option<String>,
}

impl Default for UrlParams {
  fn default() -> Self {
    Self {
      page_num: Some(1),
      page_size: Some(20),
      search: None,
      sort: None,
    }
  }
}

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Animal {
  fn id(&self) -> u64 {
    self.id
  }

  fn updated_at(&self) -> Option<&str> {
    None
  }
}

impl Cacheable for BasicPage {
  fn id(&self) -> u64 {
    self.id
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }
}

impl Cacheable for Page {
  fn id(&self) -> u64 {
    self.basic.id
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.basic.updated_at)
  }
}

impl Cacheable for Question {
  fn id(&self) -> u64 {
    self.id
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }
}

impl Cacheable for MenuItem {
  fn id(&self) -> u64 {
    self.id
  }

  fn updated_at(&self) -> Option<&str> {
    self.updated_at.as_deref()
  }
}

impl Cacheable for BasicMonth {
  fn id(&self) -> u64 {
    self.id
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }
}

impl Cacheable for Month {
  fn id(&self) -> u64 {
    self.basic.id
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.basic.updated_at)
  }
}
