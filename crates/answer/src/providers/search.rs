//! Web search client for a Serper-style JSON API

use super::SearchProvider;
use crate::snippet::Snippet;
use async_trait::async_trait;
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::Deserialize;
use std::num::NonZeroU32;
use whoqa_common::config::SearchConfig;
use whoqa_common::errors::{AppError, Result};

type OutboundLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<SearchItem>,
}

/// HTTP search client, rate limited on the way out
pub struct WebSearchClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    limiter: OutboundLimiter,
    results_per_query: usize,
}

impl WebSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "search.api_key is required for web search".to_string(),
        })?;

        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        let qps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            limiter: RateLimiter::direct(Quota::per_second(qps)),
            results_per_query: config.results_per_query,
        })
    }
}

#[async_trait]
impl SearchProvider for WebSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<Snippet>> {
        self.limiter.until_ready().await;

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": self.results_per_query }))
            .send()
            .await
            .map_err(|e| AppError::Retrieval {
                service: "search".to_string(),
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Retrieval {
                service: "search".to_string(),
                message: format!("API error {}: {}", status, body),
            });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| AppError::Retrieval {
            service: "search".to_string(),
            message: format!("Failed to parse response: {}", e),
        })?;

        tracing::debug!(query, results = parsed.organic.len(), "Search results received");

        Ok(parsed
            .organic
            .into_iter()
            .take(self.results_per_query)
            .map(|item| Snippet(item.snippet))
            .collect())
    }

    fn name(&self) -> &str {
        "web_search"
    }
}
