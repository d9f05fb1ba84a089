//! console-core: Shared client infrastructure for the ERP console.
pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod http;
pub mod inflight;
pub mod numeric;
pub mod observability;
pub mod pagination;
pub mod record;
pub mod store;

pub use error::AppError;
pub use record::{Identified, RecordId};

pub use async_trait;
pub use rust_decimal;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use validator;
