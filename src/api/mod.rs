//! Site batch API client and types.

pub mod client;
pub mod error;

pub use client::{ApiClient, server_error};
pub use error::ServerErrorKind;
