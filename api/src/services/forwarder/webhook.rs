// Generic webhook delivery (Zapier-style): the submission JSON is posted as-is, minus the token.
use super::{failure_details, ForwardFuture, Forwarder};
use crate::error::ApiError;
use shared::models::ContactRequest;

pub struct WebhookForwarder {
    client: reqwest::Client,
    url: String,
}

impl WebhookForwarder {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        WebhookForwarder { client, url }
    }

    async fn post(&self, submission: &ContactRequest) -> Result<(), ApiError> {
        let payload = ContactRequest { token: None, ..submission.clone() };
        let res = self.client.post(&self.url).json(&payload).send().await?;
        if !res.status().is_success() {
            return Err(ApiError::Upstream {
                error: "Failed to forward message",
                details: failure_details(res).await,
            });
        }
        Ok(())
    }
}

impl Forwarder for WebhookForwarder {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn forward<'a>(&'a self, submission: &'a ContactRequest) -> ForwardFuture<'a> {
        Box::pin(self.post(submission))
    }
}
