//! ERP console client.
//!
//! Typed models for the ERP REST API, invoice computations and one store per
//! bounded context, built on the `console-core` plumbing.

pub mod models;
pub mod services;
pub mod stores;

pub use stores::ConsoleState;

pub const SERVICE_NAME: &str = "erp-console";
