// api/src/services/contact_service/mod.rs
// The contact endpoint: ContactService holds what a request needs (forwarder, optional
// shared token); the axum handlers live in the sibling submit_contact module.
use crate::config::ApiSettings;
use crate::error::ApiError;
use crate::services::forwarder::{self, Forwarder};
use axum::routing::post;
use axum::Router;
use shared::models::{ContactRequest, ContactResponse};
use std::sync::Arc;
use std::time::Duration;

pub mod submit_contact;

pub const CONTACT_ROUTE: &str = "/api/contact";

#[derive(Clone)]
pub struct ContactService {
    // None when neither Discord nor webhook credentials are configured.
    forwarder: Option<Arc<dyn Forwarder>>,
    shared_token: Option<String>,
}

impl ContactService {
    pub fn new(forwarder: Option<Arc<dyn Forwarder>>, shared_token: Option<String>) -> Self {
        ContactService { forwarder, shared_token }
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.forward_timeout_secs))
            .build()?;
        let forwarder = settings
            .forward_target()
            .map(|target| forwarder::from_target(target, client));

        match &forwarder {
            Some(f) => tracing::info!(forwarder = f.name(), "Contact forwarding configured"),
            None => tracing::warn!("No forwarding credentials configured; submissions will fail with 500"),
        }

        Ok(ContactService::new(forwarder, settings.shared_token.clone()))
    }

    /// Checks credentials, then the shared token, then forwards.
    pub async fn submit(&self, submission: ContactRequest) -> Result<ContactResponse, ApiError> {
        let forwarder = self.forwarder.as_ref().ok_or(ApiError::CredentialsMissing)?;

        if let Some(expected) = &self.shared_token {
            if submission.token.as_deref() != Some(expected.as_str()) {
                return Err(ApiError::InvalidToken);
            }
        }

        forwarder.forward(&submission).await?;
        tracing::info!(forwarder = forwarder.name(), "Contact submission forwarded");
        Ok(ContactResponse::ok())
    }
}

pub fn router(service: ContactService) -> Router {
    Router::new()
        .route(
            CONTACT_ROUTE,
            post(submit_contact::handle_submit_contact)
                .fallback(submit_contact::handle_method_not_allowed),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ForwardFuture;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingForwarder {
        received: Mutex<Vec<ContactRequest>>,
    }

    impl Forwarder for RecordingForwarder {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn forward<'a>(&'a self, submission: &'a ContactRequest) -> ForwardFuture<'a> {
            self.received.lock().unwrap().push(submission.clone());
            Box::pin(async { Ok::<(), ApiError>(()) })
        }
    }

    struct RejectingForwarder;

    impl Forwarder for RejectingForwarder {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        fn forward<'a>(&'a self, _submission: &'a ContactRequest) -> ForwardFuture<'a> {
            Box::pin(async {
                Err::<(), ApiError>(ApiError::Upstream { error: "Failed to send DM", details: "Missing Access".to_string() })
            })
        }
    }

    struct BrokenForwarder;

    impl Forwarder for BrokenForwarder {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn forward<'a>(&'a self, _submission: &'a ContactRequest) -> ForwardFuture<'a> {
            Box::pin(async { Err::<(), ApiError>(anyhow::anyhow!("socket closed").into()) })
        }
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(CONTACT_ROUTE)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn call(service: ContactService, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(service).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    fn sample() -> Value {
        json!({ "name": "A", "email": "a@b.com", "subject": "S", "message": "M" })
    }

    #[tokio::test]
    async fn test_post_with_credentials_succeeds() {
        let recorder = Arc::new(RecordingForwarder::default());
        let service = ContactService::new(Some(recorder.clone()), None);

        let (status, body) = call(service, post_json(sample())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        let received = recorder.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], ContactRequest::new("A", "a@b.com", "S", "M"));
    }

    #[tokio::test]
    async fn test_get_is_method_not_allowed() {
        let service = ContactService::new(Some(Arc::new(RecordingForwarder::default())), None);
        let request = Request::builder().method("GET").uri(CONTACT_ROUTE).body(Body::empty()).unwrap();

        let (status, body) = call(service, request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_server_error() {
        let service = ContactService::new(None, None);
        let (status, body) = call(service, post_json(sample())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Discord credentials not configured");
    }

    #[tokio::test]
    async fn test_wrong_or_missing_token_is_forbidden() {
        let recorder = Arc::new(RecordingForwarder::default());
        let service = ContactService::new(Some(recorder.clone()), Some("s3cret".to_string()));

        let (status, _) = call(service.clone(), post_json(sample())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut with_bad_token = sample();
        with_bad_token["token"] = json!("guess");
        let (status, body) = call(service.clone(), post_json(with_bad_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Invalid token");

        let mut with_token = sample();
        with_token["token"] = json!("s3cret");
        let (status, _) = call(service, post_json(with_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recorder.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_rejection_is_bad_gateway() {
        let service = ContactService::new(Some(Arc::new(RejectingForwarder)), None);
        let (status, body) = call(service, post_json(sample())).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": "Failed to send DM", "details": "Missing Access" }));
    }

    #[tokio::test]
    async fn test_unexpected_failure_is_server_error() {
        let service = ContactService::new(Some(Arc::new(BrokenForwarder)), None);
        let (status, body) = call(service, post_json(sample())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
        assert_eq!(body["details"], "socket closed");
    }

    #[tokio::test]
    async fn test_malformed_body_is_server_error() {
        let service = ContactService::new(Some(Arc::new(RecordingForwarder::default())), None);
        let request = Request::builder()
            .method("POST")
            .uri(CONTACT_ROUTE)
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = call(service, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
    }
}
