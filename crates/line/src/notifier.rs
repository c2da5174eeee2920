use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use meetline_core::domain::user::LineUserId;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("push request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("push rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, to: &LineUserId, text: &str) -> Result<(), NotifyError>;

    async fn send_flex(
        &self,
        to: &LineUserId,
        alt_text: &str,
        contents: &Value,
    ) -> Result<(), NotifyError>;
}

/// Sends push messages through the LINE Messaging API.
pub struct PushNotifier {
    client: reqwest::Client,
    api_base_url: String,
    channel_access_token: SecretString,
}

impl PushNotifier {
    pub fn new(
        api_base_url: String,
        channel_access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            channel_access_token,
        })
    }

    fn push_url(&self) -> String {
        format!("{}/v2/bot/message/push", self.api_base_url)
    }

    async fn push(&self, to: &LineUserId, messages: Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.push_url())
            .bearer_auth(self.channel_access_token.expose_secret())
            .json(&json!({ "to": to.0, "messages": messages }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, detail });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    async fn send_text(&self, to: &LineUserId, text: &str) -> Result<(), NotifyError> {
        self.push(to, text_messages(text)).await
    }

    async fn send_flex(
        &self,
        to: &LineUserId,
        alt_text: &str,
        contents: &Value,
    ) -> Result<(), NotifyError> {
        self.push(to, flex_messages(alt_text, contents)).await
    }
}

/// Logs the notification instead of sending it.
///
/// Stands in for [`PushNotifier`] when no channel access token is configured,
/// so local runs and tests exercise the full workflow without LINE
/// credentials.
#[derive(Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_text(&self, to: &LineUserId, text: &str) -> Result<(), NotifyError> {
        info!(
            event_name = "egress.line.push_skipped",
            recipient = %to.0,
            message_kind = "text",
            body = %text,
            "line credentials not configured; logging notification instead of sending"
        );
        Ok(())
    }

    async fn send_flex(
        &self,
        to: &LineUserId,
        alt_text: &str,
        _contents: &Value,
    ) -> Result<(), NotifyError> {
        info!(
            event_name = "egress.line.push_skipped",
            recipient = %to.0,
            message_kind = "flex",
            alt_text = %alt_text,
            "line credentials not configured; logging notification instead of sending"
        );
        Ok(())
    }
}

fn text_messages(text: &str) -> Value {
    json!([{ "type": "text", "text": text }])
}

fn flex_messages(alt_text: &str, contents: &Value) -> Value {
    json!([{ "type": "flex", "altText": alt_text, "contents": contents }])
}
