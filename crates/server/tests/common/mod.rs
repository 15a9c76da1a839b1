//! Common test utilities for in-process API testing.
//!
//! The fixture builds the router around a composer wired to mock
//! collaborators, so requests run end to end without ffmpeg or ffprobe.

use std::ops::Deref;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use composer_core::testing::{ComposerHarness, ComposerHarnessBuilder};
use composer_core::{Config, DispatchMode};
use composer_server::api::create_router;
use composer_server::state::AppState;

/// Re-export fixtures for test convenience
pub use composer_core::testing::fixtures;

/// Test fixture: a router plus the harness behind it.
pub struct TestFixture {
    pub router: Router,
    pub harness: ComposerHarness,
    _temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Jobs wait for `POST /jobs/{id}/dispatch`.
    pub fn new() -> Self {
        Self::with(|builder| builder.dispatch(DispatchMode::External))
    }

    /// Jobs run in the worker pool as soon as they are submitted.
    pub fn with_pool() -> Self {
        Self::with(|builder| builder.dispatch(DispatchMode::Pool))
    }

    pub fn with(configure: impl FnOnce(ComposerHarnessBuilder) -> ComposerHarnessBuilder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let harness = configure(ComposerHarness::builder(temp_dir.path())).build();

        let state = Arc::new(AppState::new(Config::default(), harness.service.clone()));
        let router = create_router(state);

        Self {
            router,
            harness,
            _temp_dir: temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(json) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

impl Deref for TestFixture {
    type Target = ComposerHarness;

    fn deref(&self) -> &Self::Target {
        &self.harness
    }
}
