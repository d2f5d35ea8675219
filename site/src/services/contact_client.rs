// HTTP client for the contact endpoint.
use crate::error::SiteError;
use shared::models::{ContactRequest, ContactResponse, ErrorBody};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_FAILURE: &str = "Failed to send message";

/// How a submission failed. Each kind gets its own copy in the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

pub struct ContactClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl ContactClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SiteError> {
        let endpoint = Url::parse(endpoint)?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, endpoint, timeout })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts the submission. The whole exchange, body included, is bounded by
    /// the client timeout; running out of time is always `Timeout`.
    pub async fn submit(&self, submission: &ContactRequest) -> Result<ContactResponse, SubmissionError> {
        tracing::info!(endpoint = %self.endpoint, "Submitting contact form");
        match tokio::time::timeout(self.timeout, self.exchange(submission)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Contact request timed out");
                Err(SubmissionError::Timeout)
            }
        }
    }

    async fn exchange(&self, submission: &ContactRequest) -> Result<ContactResponse, SubmissionError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(submission)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| DEFAULT_FAILURE.to_string());
            tracing::warn!(status = status.as_u16(), message = %message, "Contact submission rejected");
            return Err(SubmissionError::Rejected { status: status.as_u16(), message });
        }

        match serde_json::from_str::<ContactResponse>(&body) {
            Ok(response) if response.success => Ok(response),
            _ => Err(SubmissionError::Rejected { status: status.as_u16(), message: DEFAULT_FAILURE.to_string() }),
        }
    }
}

fn classify_transport(e: &reqwest::Error) -> SubmissionError {
    if e.is_timeout() {
        SubmissionError::Timeout
    } else {
        SubmissionError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_endpoint(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/api/contact",
            post(move |Json(_req): Json<Value>| async move { (status, Json(body)) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/contact", addr)
    }

    fn submission() -> ContactRequest {
        ContactRequest::new("A", "a@b.com", "S", "M")
    }

    #[tokio::test]
    async fn test_success_response() {
        let url = spawn_endpoint(StatusCode::OK, json!({ "success": true })).await;
        let client = ContactClient::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(client.submit(&submission()).await, Ok(ContactResponse::ok()));
    }

    #[tokio::test]
    async fn test_rejection_carries_error_field() {
        let url = spawn_endpoint(StatusCode::BAD_GATEWAY, json!({ "error": "Failed to send DM", "details": "x" })).await;
        let client = ContactClient::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.submit(&submission()).await,
            Err(SubmissionError::Rejected { status: 502, message: "Failed to send DM".into() })
        );
    }

    #[tokio::test]
    async fn test_silent_server_is_a_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold connections without ever answering.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = ContactClient::new(&format!("http://{}/api/contact", addr), Duration::from_millis(100)).unwrap();
        assert_eq!(client.submit(&submission()).await, Err(SubmissionError::Timeout));
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ContactClient::new(&format!("http://{}/api/contact", addr), Duration::from_secs(5)).unwrap();
        assert!(matches!(client.submit(&submission()).await, Err(SubmissionError::Network(_))));
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(matches!(
            ContactClient::new("not a url", Duration::from_secs(1)),
            Err(SiteError::InvalidEndpoint { .. })
        ));
    }
}
