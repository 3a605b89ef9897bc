//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`pixelstore_common::Error`] so that route
//! handlers can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pixelstore_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self { inner }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in storage handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.kind().code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_produces_404() {
        let err = AppError::new(Error::from_status(404, "2024/05/gone.png"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["code"], "not_found");
        assert!(json["error"].as_str().unwrap().contains("2024/05/gone.png"));
    }

    #[tokio::test]
    async fn not_implemented_produces_501() {
        let response = AppError::from(Error::not_implemented()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body_json(response).await["code"], "not_implemented");
    }

    #[test]
    fn permission_produces_403() {
        let response = AppError::from(Error::from_status(403, "x")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
