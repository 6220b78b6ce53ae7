//! Backend client adapter for the platform's GraphQL management API.
//!
//! Every call carries the single static bearer credential from
//! [`railmcp_core::ApiConfig`]. There are no retries and no per-request
//! credentials; a backend failure surfaces directly as an [`ApiError`].

mod client;
mod error;
pub mod queries;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
