use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use voxtap_core::EngineError;
use voxtap_providers::ProviderError;

pub enum AppError {
    Engine(EngineError),
    ElementNotFound,
    PayloadTooLarge,
    ProviderUnavailable,
    Provider(ProviderError),
    ProviderTimeout,
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

/// Malformed or mistyped request bodies are reported like any other bad
/// input instead of axum's plain-text rejection.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::Engine(EngineError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Engine(EngineError::InvalidInput(detail)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "detail": detail }),
            ),
            AppError::Engine(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.code() })),
            AppError::ElementNotFound => (StatusCode::BAD_REQUEST, json!({ "error": "no_match" })),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "payload_too_large" }),
            ),
            AppError::ProviderUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "provider_unavailable" }),
            ),
            AppError::Provider(err) => {
                tracing::error!("Provider error: {}", err);
                (StatusCode::BAD_GATEWAY, json!({ "error": "provider_error" }))
            }
            AppError::ProviderTimeout => {
                tracing::error!("Provider timed out");
                (StatusCode::GATEWAY_TIMEOUT, json!({ "error": "provider_timeout" }))
            }
        };
        (status, Json(body)).into_response()
    }
}
