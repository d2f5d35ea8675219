// Outbound delivery of accepted contact submissions.
use crate::config::ForwardTarget;
use crate::error::ApiError;
use shared::models::ContactRequest;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod discord;
pub mod webhook;

pub use discord::DiscordForwarder;
pub use webhook::WebhookForwarder;

pub type ForwardFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>>;

/// Delivers one submission to an external messaging service.
///
/// A non-success answer from the service is `ApiError::Upstream` (502);
/// a transport failure is `ApiError::Transport` (500). No retries.
pub trait Forwarder: Send + Sync {
    fn name(&self) -> &'static str;
    fn forward<'a>(&'a self, submission: &'a ContactRequest) -> ForwardFuture<'a>;
}

pub fn from_target(target: ForwardTarget, client: reqwest::Client) -> Arc<dyn Forwarder> {
    match target {
        ForwardTarget::Discord { credentials, api_base } => {
            Arc::new(DiscordForwarder::new(client, credentials, api_base))
        }
        ForwardTarget::Webhook { url } => Arc::new(WebhookForwarder::new(client, url)),
    }
}

// Reads the body of a failed upstream response for the `details` field.
pub(crate) async fn failure_details(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.is_empty() => text,
        _ => status.to_string(),
    }
}
