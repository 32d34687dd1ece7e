//! Pages: log and month pages of the current animal.

use futures::future::BoxFuture;

use crate::error::Result;
use crate::models::{BasicPage, Page, PagingInfo, UrlParams};

use super::Resource;

/// Search filter selecting published log pages.
pub const PUBLISHED_LOGS: &str = "status=1,page_type=log";

pub type Pages = Resource<Page, BasicPage>;

impl Resource<Page, BasicPage> {
  /// Get all published log pages.
  pub fn get_all_published(&self, mut params: UrlParams) -> BoxFuture<'static, Result<PagingInfo<BasicPage>>> {
    params.search = Some(PUBLISHED_LOGS.to_string());
    self.get_all(params)
  }
}
