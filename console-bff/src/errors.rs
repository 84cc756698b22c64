use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use std::any::Any;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub error: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with an error message and status code
    pub fn new<S: ToString>(error: S, status_code: StatusCode) -> Self {
        Self {
            error: error.to_string(),
            status_code,
        }
    }

    /// Create new Internal Server Error (500) with an error message
    pub fn internal<S: ToString>(error: S) -> Self {
        Self::new(error, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Bad Request Error (400) with an error message
    pub fn bad_request<S: ToString>(error: S) -> Self {
        Self::new(error, StatusCode::BAD_REQUEST)
    }

    /// Create new Forbidden Error (403) with an error message
    pub fn forbidden<S: ToString>(error: S) -> Self {
        Self::new(error, StatusCode::FORBIDDEN)
    }

    /// The referrer of a token request does not belong to the console
    pub fn unauthorized_client() -> Self {
        Self::bad_request("Unauthorized Client")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code;
        let body = json!({
            "error": self.error,
        });
        (status_code, Json(body)).into_response()
    }
}

/// Turns a handler panic into a 500 instead of dropping the connection
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    log::error!("Request handler panicked: {}", detail);
    ApiError::internal("Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_unauthorized_client_response() {
        let response = ApiError::unauthorized_client().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"Unauthorized Client"}"#);
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"Internal Server Error"}"#);
    }

    #[test]
    fn test_internal_error_status() {
        let error = ApiError::internal("boom");
        assert_eq!(error.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error, "boom");
    }
}
