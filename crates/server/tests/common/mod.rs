//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the Axum router over an `AppState` whose catalog
//! seam is the mock implementation, so handlers can be exercised without
//! any external infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tellysync_core::testing::MockSeriesCatalog;
use tellysync_core::{
    create_authenticator, AuthConfig, CatalogCache, Config, SeriesCatalog, WebhookReconciler,
};
use tellysync_server::api::create_router;
use tellysync_server::state::AppState;

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use tellysync_core::testing::fixtures;

/// Test fixture for in-process API testing.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock catalog - configure series/episodes/calendar
    pub catalog: Arc<MockSeriesCatalog>,
    /// The shared catalog cache (mutated by webhook events)
    pub cache: Arc<CatalogCache>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Fixture options.
#[derive(Default)]
pub struct TestConfig {
    /// Auth section for the webhook secret check.
    pub auth: AuthConfig,
    /// Leave the catalog seam unconfigured (503 paths).
    pub without_catalog: bool,
}

impl TestFixture {
    /// Create a new test fixture with default config and a mock catalog.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let config = Config {
            auth: test_config.auth.clone(),
            ..tellysync_core::load_config_from_str("").unwrap()
        };

        let authenticator = Arc::from(
            create_authenticator(&test_config.auth).expect("Failed to create authenticator"),
        );
        let cache = Arc::new(CatalogCache::default());
        let reconciler = Arc::new(WebhookReconciler::new(Arc::clone(&cache)));
        let catalog = Arc::new(MockSeriesCatalog::new());

        let catalog_seam: Option<Arc<dyn SeriesCatalog>> = if test_config.without_catalog {
            None
        } else {
            Some(Arc::clone(&catalog) as Arc<dyn SeriesCatalog>)
        };

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::clone(&cache),
            reconciler,
            catalog_seam,
            None, // No orchestrator for API tests
        ));

        Self {
            router: create_router(state),
            catalog,
            cache,
        }
    }

    /// Send a GET request to the in-process router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &body.to_string(), &[]).await
    }

    /// Send a POST request with a raw body and extra headers.
    pub async fn post_raw(
        &self,
        path: &str,
        body: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
