// Discord delivery: open a DM channel with the site owner, then post an embed into it.
use super::{failure_details, ForwardFuture, Forwarder};
use crate::config::DiscordCredentials;
use crate::error::ApiError;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::models::ContactRequest;

pub const EMBED_TITLE: &str = "New Inquiry";
pub const EMBED_COLOR: u32 = 0x4f46e5;
pub const EMBED_FOOTER: &str = "Portfolio Contact";

#[derive(Debug, Deserialize)]
struct DmChannel {
    id: String,
}

pub struct DiscordForwarder {
    client: reqwest::Client,
    credentials: DiscordCredentials,
    api_base: String,
}

impl DiscordForwarder {
    pub fn new(client: reqwest::Client, credentials: DiscordCredentials, api_base: String) -> Self {
        DiscordForwarder { client, credentials, api_base }
    }

    async fn send_dm(&self, submission: &ContactRequest) -> Result<(), ApiError> {
        let auth = format!("Bot {}", self.credentials.bot_token);

        let dm_res = self
            .client
            .post(format!("{}/users/@me/channels", self.api_base))
            .header(AUTHORIZATION, &auth)
            .json(&json!({ "recipient_id": self.credentials.user_id }))
            .send()
            .await?;
        if !dm_res.status().is_success() {
            return Err(ApiError::Upstream {
                error: "Failed to create DM channel",
                details: failure_details(dm_res).await,
            });
        }
        let channel: DmChannel = dm_res.json().await?;
        tracing::debug!(channel_id = %channel.id, "Opened Discord DM channel");

        let msg_res = self
            .client
            .post(format!("{}/channels/{}/messages", self.api_base, channel.id))
            .header(AUTHORIZATION, &auth)
            .json(&json!({ "embeds": [build_embed(submission, Utc::now())] }))
            .send()
            .await?;
        if !msg_res.status().is_success() {
            return Err(ApiError::Upstream {
                error: "Failed to send DM",
                details: failure_details(msg_res).await,
            });
        }

        Ok(())
    }
}

impl Forwarder for DiscordForwarder {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn forward<'a>(&'a self, submission: &'a ContactRequest) -> ForwardFuture<'a> {
        Box::pin(self.send_dm(submission))
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

/// The embed posted for one submission. Blank fields read "N/A".
pub fn build_embed(submission: &ContactRequest, now: DateTime<Utc>) -> Value {
    json!({
        "title": EMBED_TITLE,
        "color": EMBED_COLOR,
        "fields": [
            { "name": "👤 Name", "value": or_na(&submission.name), "inline": false },
            { "name": "✉️ Email", "value": or_na(&submission.email), "inline": false },
            { "name": "📝 Subject", "value": or_na(&submission.subject), "inline": false },
            { "name": "💬 Message", "value": or_na(&submission.message), "inline": false },
        ],
        "footer": { "text": EMBED_FOOTER },
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Seen {
        auth: Vec<String>,
        dm_bodies: Vec<Value>,
        messages: Vec<(String, Value)>,
    }

    // Local stand-in for the Discord REST API.
    async fn spawn_stub(dm_status: StatusCode, msg_status: StatusCode) -> (String, Arc<Mutex<Seen>>) {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let dm_seen = seen.clone();
        let msg_seen = seen.clone();

        let app = Router::new()
            .route(
                "/users/@me/channels",
                post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                    let mut seen = dm_seen.lock().unwrap();
                    if let Some(auth) = headers.get("authorization") {
                        seen.auth.push(auth.to_str().unwrap().to_string());
                    }
                    seen.dm_bodies.push(body);
                    (dm_status, Json(json!({ "id": "chan-1" })))
                }),
            )
            .route(
                "/channels/:id/messages",
                post(move |Path(id): Path<String>, Json(body): Json<Value>| async move {
                    msg_seen.lock().unwrap().messages.push((id, body));
                    (msg_status, "{\"message\":\"stub\"}")
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    fn forwarder(base: String) -> DiscordForwarder {
        let credentials = DiscordCredentials { bot_token: "bot-token".into(), user_id: "1234".into() };
        DiscordForwarder::new(reqwest::Client::new(), credentials, base)
    }

    #[test]
    fn test_embed_fills_blank_fields() {
        let submission = ContactRequest::new("A", "", "S", "");
        let embed = build_embed(&submission, Utc::now());
        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["value"], "A");
        assert_eq!(fields[1]["value"], "N/A");
        assert_eq!(fields[3]["value"], "N/A");
        assert_eq!(embed["color"], EMBED_COLOR);
        assert_eq!(embed["title"], EMBED_TITLE);
    }

    #[tokio::test]
    async fn test_forward_opens_dm_then_posts_embed() {
        let (base, seen) = spawn_stub(StatusCode::OK, StatusCode::OK).await;
        let submission = ContactRequest::new("A", "a@b.com", "S", "M");

        forwarder(base).forward(&submission).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.auth, vec!["Bot bot-token".to_string()]);
        assert_eq!(seen.dm_bodies[0], json!({ "recipient_id": "1234" }));
        assert_eq!(seen.messages.len(), 1);
        let (channel, body) = &seen.messages[0];
        assert_eq!(channel, "chan-1");
        assert_eq!(body["embeds"][0]["fields"][2]["value"], "S");
    }

    #[tokio::test]
    async fn test_dm_channel_failure_is_upstream_error() {
        let (base, seen) = spawn_stub(StatusCode::UNAUTHORIZED, StatusCode::OK).await;
        let submission = ContactRequest::new("A", "a@b.com", "S", "M");

        let err = forwarder(base).forward(&submission).await.unwrap_err();
        match err {
            ApiError::Upstream { error, .. } => assert_eq!(error, "Failed to create DM channel"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(seen.lock().unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_message_failure_is_upstream_error_with_details() {
        let (base, _seen) = spawn_stub(StatusCode::OK, StatusCode::FORBIDDEN).await;
        let submission = ContactRequest::new("A", "a@b.com", "S", "M");

        let err = forwarder(base).forward(&submission).await.unwrap_err();
        match err {
            ApiError::Upstream { error, details } => {
                assert_eq!(error, "Failed to send DM");
                assert!(details.contains("stub"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        // Bind and drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submission = ContactRequest::new("A", "a@b.com", "S", "M");
        let err = forwarder(format!("http://{}", addr)).forward(&submission).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
