// Core types and configuration for the railmcp tool server

pub mod config;
pub mod types;

pub use config::{ApiConfig, ConfigError};
pub use types::*;
