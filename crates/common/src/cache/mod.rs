//! Result cache integration
//!
//! Provides:
//! - The `ResultCache` capability injected into the answer pipeline
//! - Redis-backed cache with optional TTL
//! - In-memory cache for tests and cache-less deployments
//! - Typed JSON helpers and key builders

use crate::config::RedisConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Key-value store for provider results, keyed by exact query/question text
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Fetch a stored value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one
    async fn put(&self, key: &str, value: String) -> Result<()>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Backend name used in logs and metrics
    fn name(&self) -> &str;
}

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
    /// TTL in seconds, 0 keeps entries forever
    pub ttl_secs: u64,
    /// Key prefix for namespacing
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            ttl_secs: 0,
            key_prefix: "whoqa".to_string(),
        }
    }
}

/// Redis cache client
pub struct RedisCache {
    connection: RwLock<MultiplexedConnection>,
    config: CacheConfig,
}

impl RedisCache {
    /// Create a new cache client
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e| AppError::CacheError {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection: RwLock::new(connection),
            config,
        })
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl ResultCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        let value: Option<String> = conn.get(&full_key).await.map_err(|e| AppError::CacheError {
            message: format!("Failed to get key '{}': {}", full_key, e),
        })?;

        debug!(key = %full_key, hit = value.is_some(), "Redis lookup");
        Ok(value)
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        let outcome = if self.config.ttl_secs == 0 {
            conn.set::<_, _, ()>(&full_key, value).await
        } else {
            conn.set_ex::<_, _, ()>(&full_key, value, self.config.ttl_secs).await
        };
        outcome.map_err(|e| AppError::CacheError {
            message: format!("Failed to set key '{}': {}", full_key, e),
        })?;

        debug!(key = %full_key, ttl_secs = self.config.ttl_secs, "Redis set");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.write().await;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

/// Process-local cache
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Cache backend for the given settings. Falls back to the in-memory cache
/// when Redis is not configured or unreachable.
pub async fn connect(config: &RedisConfig) -> Arc<dyn ResultCache> {
    let Some(url) = config.url.clone() else {
        warn!("Redis URL not set, using in-memory result cache");
        return Arc::new(InMemoryCache::new());
    };

    let cache_config = CacheConfig {
        url,
        ttl_secs: config.ttl_secs,
        key_prefix: config.key_prefix.clone(),
    };
    match RedisCache::new(cache_config).await {
        Ok(cache) => {
            info!("Redis result cache connected");
            Arc::new(cache)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to Redis, using in-memory result cache");
            Arc::new(InMemoryCache::new())
        }
    }
}

/// Read and decode a JSON value. Backend and decoding failures degrade to a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn ResultCache, key: &str) -> Option<T> {
    let raw = match cache.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            crate::metrics::record_cache(false, cache.name());
            return None;
        }
        Err(e) => {
            warn!(error = %e, key, "Cache read failed, treating as miss");
            crate::metrics::record_cache(false, cache.name());
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => {
            debug!(key, "Cache hit");
            crate::metrics::record_cache(true, cache.name());
            Some(value)
        }
        Err(e) => {
            warn!(error = %e, key, "Cached value is malformed, treating as miss");
            crate::metrics::record_cache(false, cache.name());
            None
        }
    }
}

/// Encode and store a JSON value. Failures are logged and swallowed.
pub async fn put_json<T: Serialize + ?Sized>(cache: &dyn ResultCache, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, key, "Failed to serialize value, continuing without cache");
            return;
        }
    };

    if let Err(e) = cache.put(key, json).await {
        warn!(error = %e, key, "Failed to cache value, continuing without cache");
    }
}

/// Cache key builders
pub mod keys {
    /// Raw snippets for a rewritten query
    pub fn search_query(query_text: &str) -> String {
        format!("search:{}", query_text)
    }

    /// Structured engine outcome for a question
    pub fn structured(question: &str) -> String {
        format!("structured:{}", question)
    }
}
