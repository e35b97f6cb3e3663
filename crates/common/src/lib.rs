//! WhoQA Common Library
//!
//! Shared code for the WhoQA answer pipeline and its services:
//! - Error types and handling
//! - Configuration management
//! - Result cache abstraction (Redis and in-memory)
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use cache::{InMemoryCache, RedisCache, ResultCache};
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
