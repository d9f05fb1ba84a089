//! HTTP transport to the ERP REST API.

mod client;
mod transport;

pub use client::ApiClient;
pub use transport::{ApiRequest, Transport};
pub use reqwest::Method;
