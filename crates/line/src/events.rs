use serde::Deserialize;

use meetline_core::domain::user::LineUserId;

/// One webhook delivery from the LINE platform.
///
/// Field names follow the Messaging API wire format (camelCase); unknown
/// fields are ignored so new event kinds do not break deserialization.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<MessagePayload>,
    #[serde(default)]
    pub postback: Option<PostbackPayload>,
    #[serde(rename = "replyToken", default)]
    pub reply_token: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "groupId", default)]
    pub group_id: Option<String>,
    #[serde(rename = "roomId", default)]
    pub room_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PostbackPayload {
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    TextMessage(TextMessageEvent),
    Ignored { event_type: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub sender: LineUserId,
    pub text: String,
}

/// Reduces a webhook event to the single kind the service acts on.
///
/// Only text messages from an identifiable user are actionable. Everything
/// else (stickers, follows, postbacks, group messages without a `userId`)
/// is classified as ignored and acknowledged without processing.
pub fn classify_event(event: &WebhookEvent) -> InboundEvent {
    if event.event_type != "message" {
        return ignored(event);
    }
    let Some(message) = &event.message else {
        return ignored(event);
    };
    if message.message_type != "text" {
        return ignored(event);
    }
    let text = message.text.as_deref().unwrap_or_default();
    if text.trim().is_empty() {
        return ignored(event);
    }
    let sender = event
        .source
        .as_ref()
        .and_then(|source| source.user_id.as_deref())
        .filter(|value| !value.is_empty());
    let Some(sender) = sender else {
        return ignored(event);
    };

    InboundEvent::TextMessage(TextMessageEvent {
        sender: LineUserId(sender.to_string()),
        text: text.to_string(),
    })
}

fn ignored(event: &WebhookEvent) -> InboundEvent {
    let event_type = match &event.message {
        Some(message) if event.event_type == "message" => {
            format!("{}/{}", event.event_type, message.message_type)
        }
        _ => event.event_type.clone(),
    };
    InboundEvent::Ignored { event_type }
}
