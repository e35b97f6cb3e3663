//! WhoQA API Gateway
//!
//! HTTP entry point for the answer pipeline.
//! Handles:
//! - Rate limiting
//! - Request routing to the ranking and resolving pipelines
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use whoqa_answer::Answerer;
use whoqa_common::{
    cache::{self, ResultCache},
    config::AppConfig,
    metrics,
};

use crate::middleware::rate_limit::{create_rate_limiter, rate_limit_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub answerer: Arc<Answerer>,
    pub cache: Arc<dyn ResultCache>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting WhoQA API Gateway v{}", whoqa_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Initialize the result cache and the pipeline
    let cache = cache::connect(&config.redis).await;
    let answerer = Answerer::from_config(&config, cache.clone())?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        answerer: Arc::new(answerer),
        cache,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Answer routes
    let mut api_routes = Router::new()
        .route("/answers/rank", post(handlers::answers::rank))
        .route("/answers/resolve", post(handlers::answers::resolve));

    let server = &state.config.server;
    if let Some(limiter) = create_rate_limiter(server.rate_limit_rps, server.rate_limit_burst) {
        api_routes = api_routes.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    // Compose the app
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use whoqa_answer::providers::DisabledEngine;
    use whoqa_answer::{SearchProvider, Snippet};
    use whoqa_common::cache::InMemoryCache;
    use whoqa_common::errors::Result;

    struct FixedSearch;

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<Snippet>> {
            Ok(vec![Snippet("The Iliad was written by Homer.".to_string())])
        }
    }

    fn test_router(config: AppConfig) -> Router {
        let cache: Arc<dyn ResultCache> = Arc::new(InMemoryCache::new());
        let answerer = Answerer::from_parts(
            Arc::new(FixedSearch),
            Arc::new(DisabledEngine),
            cache.clone(),
            &config,
        );
        create_router(AppState {
            config: Arc::new(config),
            answerer: Arc::new(answerer),
            cache,
        })
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router(AppConfig::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ready_reports_cache() {
        let response = test_router(AppConfig::default())
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["cache"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_rank_truncates_to_limit() {
        let (status, body) = post_json(
            test_router(AppConfig::default()),
            "/v1/answers/rank",
            json!({"question": "Who wrote the Iliad?", "limit": 2}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"], "Who wrote the Iliad?");
        let answers = body["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0]["text"], "Homer");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_free_text() {
        let (status, body) = post_json(
            test_router(AppConfig::default()),
            "/v1/answers/resolve",
            json!({"question": "Who wrote the Iliad?"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Homer");
    }

    #[tokio::test]
    async fn test_single_token_question_is_rejected() {
        let (status, body) = post_json(
            test_router(AppConfig::default()),
            "/v1/answers/rank",
            json!({"question": "Who"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_QUESTION");
    }

    #[tokio::test]
    async fn test_empty_question_fails_validation() {
        let (status, body) = post_json(
            test_router(AppConfig::default()),
            "/v1/answers/resolve",
            json!({"question": ""}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_past_burst() {
        let mut config = AppConfig::default();
        config.server.rate_limit_rps = 1;
        config.server.rate_limit_burst = 1;
        let router = test_router(config);

        let body = json!({"question": "Who wrote the Iliad?"});
        let (first, _) = post_json(router.clone(), "/v1/answers/resolve", body.clone()).await;
        assert_eq!(first, StatusCode::OK);

        let request = Request::builder()
            .method("POST")
            .uri("/v1/answers/resolve")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let second = router.oneshot(request).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
