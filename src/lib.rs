//! Client SDK for the Animal Rails API.
//!
//! Every HTTP call goes through one FIFO task queue, payload keys are translated
//! between the API's snake_case and the application's camelCase, and single
//! entities are cached until a list response shows they changed.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod resources;
pub mod sdk;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use error::{ApiError, Result, SdkError};
pub use queue::{TaskHandle, TaskQueue};
pub use sdk::AnimalSdk;
