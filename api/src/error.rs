use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::models::ErrorBody;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Discord credentials not configured")]
    CredentialsMissing,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    // The messaging service answered, but not with a success status.
    #[error("{error}: {details}")]
    Upstream { error: &'static str, details: String },

    #[error("HTTP transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::CredentialsMissing
            | ApiError::InvalidBody(_)
            | ApiError::Transport { .. }
            | ApiError::AnyhowError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::MethodNotAllowed | ApiError::InvalidToken | ApiError::CredentialsMissing => {
                ErrorBody::new(self.to_string())
            }
            ApiError::Upstream { error, details } => ErrorBody::with_details(*error, details.clone()),
            ApiError::InvalidBody(msg) => ErrorBody::with_details("Server error", msg.clone()),
            ApiError::Transport { source } => ErrorBody::with_details("Server error", source.to_string()),
            ApiError::AnyhowError(source) => ErrorBody::with_details("Server error", format!("{:#}", source)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Contact request failed: {:?}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "Contact request rejected: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::CredentialsMissing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let upstream = ApiError::Upstream { error: "Failed to send DM", details: "nope".into() };
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_body_carries_details() {
        let err = ApiError::Upstream { error: "Failed to create DM channel", details: "401: Unauthorized".into() };
        assert_eq!(err.body(), ErrorBody::with_details("Failed to create DM channel", "401: Unauthorized"));
    }

    #[test]
    fn test_anyhow_maps_to_server_error() {
        let err: ApiError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().error, "Server error");
        assert_eq!(err.body().details.as_deref(), Some("boom"));
    }
}
