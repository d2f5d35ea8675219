// Handlers for the contact route.
use super::ContactService;
use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use shared::models::{ContactRequest, ContactResponse};

pub async fn handle_submit_contact(
    State(service): State<ContactService>,
    body: Bytes,
) -> Result<Json<ContactResponse>, ApiError> {
    // Parsed by hand so a bad body maps onto our error shape instead of axum's rejection text.
    let submission: ContactRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;

    tracing::info!(
        has_subject = !submission.subject.is_empty(),
        has_token = submission.token.is_some(),
        message_len = submission.message.len(),
        "Received contact submission"
    );

    service.submit(submission).await.map(Json)
}

pub async fn handle_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
