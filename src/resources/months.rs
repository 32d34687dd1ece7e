//! Pregnancy months of the current animal.

use chrono::{Datelike, NaiveDate, Utc};
use futures::future::BoxFuture;

use crate::error::{Result, SdkError};
use crate::models::{BasicMonth, Month, PagingInfo, UrlParams};
use crate::queue::TaskHandle;

use super::{CurrentAnimal, Resource};

/// Sort used for month listings.
pub const BY_NUMBER: &str = "number asc";

/// Whole months between `start` and `end`, ignoring days, floored at zero.
///
/// The month of `start` itself is not counted: Jan 31 to Mar 1 is 1.
pub fn month_diff(start: NaiveDate, end: NaiveDate) -> u32 {
  let months = (end.year() - start.year()) * 12 - (start.month0() as i32 + 1) + end.month0() as i32;
  months.max(0) as u32
}

/// Months resource plus the current-month calculation.
#[derive(Clone)]
pub struct Months {
  resource: Resource<Month, BasicMonth>,
  current: CurrentAnimal,
}

impl Months {
  pub fn new(resource: Resource<Month, BasicMonth>, current: CurrentAnimal) -> Self {
    Self { resource, current }
  }

  pub fn resource(&self) -> &Resource<Month, BasicMonth> {
    &self.resource
  }

  /// Month number the current animal is in, resolved in queue order.
  pub fn current(&self) -> TaskHandle<u32> {
    let current = self.current.clone();
    self
      .resource
      .client()
      .queue()
      .submit(move || async move {
        let animal = current.get().ok_or(SdkError::NoCurrentAnimal)?;
        let conceived = parse_date(&animal.conceived_on)?;
        Ok(month_diff(conceived, Utc::now().date_naive()) + 1)
      })
  }

  /// Get all months ordered by month number.
  pub fn get_all_ordered(&self, mut params: UrlParams) -> BoxFuture<'static, Result<PagingInfo<BasicMonth>>> {
    params.sort = Some(BY_NUMBER.to_string());
    self.resource.get_all(params)
  }
}

impl std::ops::Deref for Months {
  type Target = Resource<Month, BasicMonth>;

  fn deref(&self) -> &Self::Target {
    &self.resource
  }
}

/// Accepts a bare date or a full timestamp.
fn parse_date(s: &str) -> Result<NaiveDate> {
  let date_part = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
    .map_err(|e| SdkError::InvalidData(format!("conceived_on '{}': {}", s, e)))
}
