//! Questions asked by visitors.

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use reqwest::Method;
use serde_json::json;

use crate::error::Result;
use crate::models::{AskQuestion, PagingInfo, Question, UrlParams};

use super::Resource;

/// Search filter selecting answered questions.
pub const ANSWERED: &str = "response != nil";

pub type Questions = Resource<Question, Question>;

impl Resource<Question, Question> {
  /// Get only answered questions.
  pub fn get_all_answered(&self, mut params: UrlParams) -> BoxFuture<'static, Result<PagingInfo<Question>>> {
    params.search = Some(ANSWERED.to_string());
    self.get_all(params)
  }

  /// Create a question with no answer.
  pub fn ask(&self, question: &AskQuestion) -> BoxFuture<'static, Result<Question>> {
    let body = match serde_json::to_value(question) {
      Ok(question) => json!({ "question": question }),
      Err(e) => return future::ready(Err(e.into())).boxed(),
    };
    self.call_collection(Method::POST, body)
  }
}
