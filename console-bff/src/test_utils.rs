use crate::config::AppConfig;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

/// Test fixture for exercising the console backend against a stub identity
/// provider.
///
/// The default fixture runs in production mode with the internal service
/// pointing at `upstream_mock`, so token requests land on the mock server.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     Mock::given(matchers::method("POST"))
///         .and(matchers::path("/oauth2/v1/token"))
///         .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
///         .expect(1)
///         .mount(&fixture.upstream_mock)
///         .await;
///
///     let response = fixture
///         .post_json_with_headers("/adminconsole/token", &json!({}), &[("referer", "https://ssp.example.com/")])
///         .await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the application was built with
    pub config: AppConfig,
    /// Stub identity provider
    pub upstream_mock: MockServer,
}

impl TestFixture {
    /// Creates a production-mode fixture wired to a fresh mock upstream
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let upstream_mock = MockServer::start().await;
        let config = AppConfig::for_test_with_mock(&upstream_mock);
        Self::build(config, upstream_mock).await
    }

    /// Creates a fixture with a caller-provided configuration.
    /// The mock upstream is still started but only used if `config` points at it.
    pub async fn with_config(config: AppConfig) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let upstream_mock = MockServer::start().await;
        Self::build(config, upstream_mock).await
    }

    async fn build(config: AppConfig, upstream_mock: MockServer) -> Self {
        let state = AppState::for_testing(&config);
        let app = create_app(state).await;

        Self {
            app,
            config,
            upstream_mock,
        }
    }

    /// Initializes the test logger with the given level
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Creates a request builder with the given extra headers
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder
    }

    /// Sends a GET request to the specified URI
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        self.get_with_headers(uri, &[]).await
    }

    /// Sends a GET request with custom headers
    pub async fn get_with_headers(
        &self,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.send_with_headers(Method::GET, uri, headers).await
    }

    /// Sends a body-less request with custom headers
    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let request = self
            .request_builder(method, uri, headers)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body and custom headers
    pub async fn post_json_with_headers<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body to JSON");
        self.post_raw_with_headers(uri, "application/json", json_body, headers)
            .await
    }

    /// Sends a POST request with a form-encoded body and custom headers
    pub async fn post_form_with_headers(
        &self,
        uri: impl AsRef<str>,
        body: impl Into<String>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.post_raw_with_headers(uri, "application/x-www-form-urlencoded", body, headers)
            .await
    }

    /// Sends a POST request with an arbitrary body and content type
    pub async fn post_raw_with_headers(
        &self,
        uri: impl AsRef<str>,
        content_type: &str,
        body: impl Into<String>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let request = self
            .request_builder(Method::POST, uri, headers)
            .header("Content-Type", content_type)
            .body(Body::from(body.into()))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and collects the response
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let body = String::from_utf8_lossy(&bytes).into_owned();
        // Try to parse as JSON, defaulting to null for empty or non-JSON bodies
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            json,
        }
    }
}

/// Response from a test request
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: String,
    /// Response body as JSON (`Value::Null` if absent or not JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Asserts that the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }
}
