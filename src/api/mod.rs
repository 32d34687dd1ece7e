//! Rails API client: URL building, wire-format translation, auth and response
//! classification on top of the task queue.

pub mod case;
pub mod client;
pub mod transport;

pub use client::{ApiClient, Endpoint, SuccessHook, DEFAULT_API_VERSION};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
