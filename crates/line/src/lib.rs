//! LINE Integration - Messaging API webhook interface
//!
//! This crate provides the LINE interface for meetline:
//! - **Events** (`events`) - Webhook payload model and event classification
//! - **Notifier** (`notifier`) - Push messages via the Messaging API
//! - **Signature** (`signature`) - `x-line-signature` verification
//!
//! # Getting Started
//!
//! 1. Create a Messaging API channel at https://developers.line.biz/console/
//! 2. Point the channel webhook URL at `POST /webhook/line`
//! 3. Set env vars: `MEETLINE_LINE_CHANNEL_ACCESS_TOKEN`,
//!    `MEETLINE_LINE_CHANNEL_SECRET`
//!
//! # Architecture
//!
//! ```text
//! LINE Webhook → classify_event → Interaction Workflow → Core + DB
//!                                        ↓
//!                                  PushNotifier → LINE Push API
//! ```
//!
//! # Key Types
//!
//! - `WebhookRequest` - Deserialized webhook delivery (destination + events)
//! - `InboundEvent` - Classification result: text message or ignored
//! - `Notifier` - Trait for outbound messages, with push and no-op variants
//! - `verify_signature` - HMAC-SHA256 check against the channel secret

pub mod events;
pub mod notifier;
pub mod signature;

pub use events::{classify_event, InboundEvent, TextMessageEvent, WebhookEvent, WebhookRequest};
pub use notifier::{NoopNotifier, Notifier, NotifyError, PushNotifier};
pub use signature::{verify_signature, SignatureError};
