use crate::gateway::WorkerUnavailable;
use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Every failure is reported as HTTP 500 with `{"error": "<message>"}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed path, query or body value
    #[error("{0}")]
    BadInput(String),

    /// Provider call failed (network, auth, rate limit, unknown chat, ...)
    #[error("{0:#}")]
    Provider(anyhow::Error),

    /// The gateway worker has stopped
    #[error("{0}")]
    Unavailable(WorkerUnavailable),

    /// The account has no dialogs to pick a first chat from
    #[error("No chats found!")]
    NoChats,
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<WorkerUnavailable>() {
            Ok(unavailable) => Self::Unavailable(unavailable),
            Err(e) => Self::Provider(e),
        }
    }
}

// Extractor rejections would otherwise answer with axum's plain-text 4xx
impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::BadInput(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadInput(e.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_stopped_worker_maps_to_unavailable() {
        let err: ApiError = anyhow::Error::from(WorkerUnavailable::NotRunning).into();
        assert!(matches!(err, ApiError::Unavailable(_)));
        assert_eq!(err.to_string(), "Gateway worker is not running");
    }

    #[test]
    fn test_provider_error_keeps_context_chain() {
        let err: ApiError = anyhow!("FLOOD_WAIT_30")
            .context("Failed to fetch dialogs")
            .into();
        assert!(matches!(err, ApiError::Provider(_)));
        assert_eq!(err.to_string(), "Failed to fetch dialogs: FLOOD_WAIT_30");
    }

    #[test]
    fn test_every_variant_is_500() {
        for err in [
            ApiError::BadInput("bad".to_string()),
            ApiError::NoChats,
            ApiError::Unavailable(WorkerUnavailable::DroppedRequest),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
