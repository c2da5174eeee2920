use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use meetline_line::{classify_event, verify_signature, InboundEvent, WebhookRequest};

use crate::workflow::InteractionWorkflow;

/// Header carrying the LINE platform signature over the request body.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Clone)]
pub struct WebhookState {
    pub workflow: Arc<InteractionWorkflow>,
    pub channel_secret: Option<SecretString>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/webhook/line", post(receive_webhook)).with_state(state)
}

/// Accepts a LINE webhook delivery and processes each event in order.
///
/// Authenticated deliveries are always acknowledged with 200 no matter how
/// individual events fare, so the platform never retries a delivery whose
/// failures are ours to handle. Only an invalid signature (401) or an
/// undecodable body (400) refuses the delivery outright.
pub async fn receive_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(channel_secret) = &state.channel_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if let Err(error) = verify_signature(channel_secret, &body, signature) {
            warn!(
                event_name = "ingress.line.signature_rejected",
                error = %error,
                "webhook delivery rejected: signature verification failed"
            );
            return (StatusCode::UNAUTHORIZED, Json(json!({ "status": "unauthorized" })));
        }
    }

    let request: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(
                event_name = "ingress.line.body_undecodable",
                error = %error,
                "webhook delivery rejected: body is not a webhook payload"
            );
            return (StatusCode::BAD_REQUEST, Json(json!({ "status": "bad request" })));
        }
    };

    info!(
        event_name = "ingress.line.delivery_received",
        destination = %request.destination,
        event_count = request.events.len(),
        "webhook delivery received"
    );

    for event in &request.events {
        match classify_event(event) {
            InboundEvent::TextMessage(message) => {
                match state.workflow.request_interaction(&message.sender, &message.text).await {
                    Ok(outcome) => {
                        info!(
                            event_name = "ingress.line.event_processed",
                            interaction_id = %outcome.interaction_id.0,
                            approver_id = %outcome.approver_id.0,
                            "interaction request processed"
                        );
                    }
                    Err(error) => {
                        warn!(
                            event_name = "ingress.line.event_failed",
                            sender = %message.sender.0,
                            error = %error,
                            "event processing failed; continuing with remaining events"
                        );
                    }
                }
            }
            InboundEvent::Ignored { event_type } => {
                debug!(
                    event_name = "ingress.line.event_ignored",
                    event_type = %event_type,
                    "event type is not actionable"
                );
            }
        }
    }

    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use hmac::{Hmac, Mac};
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use sha2::Sha256;
    use tower::ServiceExt;

    use meetline_core::domain::user::{LineUserId, User, UserId};
    use meetline_db::repositories::{
        InMemoryInteractionRepository, InMemoryUserRepository, InteractionRepository,
        UserRepository,
    };
    use meetline_line::NoopNotifier;

    use crate::workflow::InteractionWorkflow;

    use super::{router, WebhookState, SIGNATURE_HEADER};

    const APPROVER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    async fn seeded_state(
        channel_secret: Option<SecretString>,
    ) -> (WebhookState, Arc<InMemoryInteractionRepository>) {
        let users = Arc::new(InMemoryUserRepository::default());
        users
            .save(User {
                id: UserId("R1".to_string()),
                line_user_id: LineUserId("Uexternal1".to_string()),
                display_name: "Alice".to_string(),
                wallet_address: None,
            })
            .await
            .expect("seed requester");
        users
            .save(User {
                id: UserId(APPROVER_ID.to_string()),
                line_user_id: LineUserId("Uapprover1".to_string()),
                display_name: "Bob".to_string(),
                wallet_address: None,
            })
            .await
            .expect("seed approver");

        let interactions = Arc::new(InMemoryInteractionRepository::default());
        let workflow = Arc::new(InteractionWorkflow::new(
            users,
            interactions.clone(),
            Arc::new(NoopNotifier),
        ));

        (WebhookState { workflow, channel_secret }, interactions)
    }

    fn delivery_with_texts(texts: &[&str]) -> String {
        let events: Vec<Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "type": "message",
                    "timestamp": 1_717_000_000_000_i64,
                    "mode": "active",
                    "source": { "type": "user", "userId": "Uexternal1" },
                    "message": { "id": "100001", "type": "text", "text": text }
                })
            })
            .collect();
        json!({ "destination": "Ubot", "events": events }).to_string()
    }

    fn post_webhook(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook/line")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("build request")
    }

    fn signed_post_webhook(body: String, secret: &str) -> Request<Body> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(body.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Request::builder()
            .method("POST")
            .uri("/webhook/line")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .expect("build request")
    }

    async fn response_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        serde_json::from_slice(&bytes).expect("response body is json")
    }

    #[tokio::test]
    async fn valid_delivery_is_acknowledged_and_recorded() {
        let (state, interactions) = seeded_state(None).await;
        let body = delivery_with_texts(&[&format!("meet_{APPROVER_ID}")]);

        let response =
            router(state).oneshot(post_webhook(body)).await.expect("route the request");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, json!({ "status": "ok" }));

        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert_eq!(recorded.len(), 1);
    }

    #[tokio::test]
    async fn undecodable_body_is_refused() {
        let (state, interactions) = seeded_state(None).await;

        let response = router(state)
            .oneshot(post_webhook("{not json".to_string()))
            .await
            .expect("route the request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_body(response).await, json!({ "status": "bad request" }));

        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn non_message_events_are_acknowledged_without_writes() {
        let (state, interactions) = seeded_state(None).await;
        let body = json!({
            "destination": "Ubot",
            "events": [
                {
                    "type": "follow",
                    "timestamp": 1_717_000_000_000_i64,
                    "mode": "active",
                    "source": { "type": "user", "userId": "Uexternal1" }
                },
                {
                    "type": "message",
                    "timestamp": 1_717_000_000_001_i64,
                    "mode": "active",
                    "source": { "type": "user", "userId": "Uexternal1" },
                    "message": { "id": "100002", "type": "sticker" }
                }
            ]
        })
        .to_string();

        let response =
            router(state).oneshot(post_webhook(body)).await.expect("route the request");

        assert_eq!(response.status(), StatusCode::OK);
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn failing_event_does_not_block_later_events() {
        let (state, interactions) = seeded_state(None).await;
        let body = delivery_with_texts(&["meet_not-a-uuid", &format!("meet_{APPROVER_ID}")]);

        let response =
            router(state).oneshot(post_webhook(body)).await.expect("route the request");

        assert_eq!(response.status(), StatusCode::OK);
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert_eq!(recorded.len(), 1);
    }

    #[tokio::test]
    async fn unregistered_sender_is_still_acknowledged() {
        let (state, interactions) = seeded_state(None).await;
        let body = json!({
            "destination": "Ubot",
            "events": [{
                "type": "message",
                "timestamp": 1_717_000_000_000_i64,
                "mode": "active",
                "source": { "type": "user", "userId": "Ustranger" },
                "message": { "id": "100003", "type": "text", "text": format!("meet_{APPROVER_ID}") }
            }]
        })
        .to_string();

        let response =
            router(state).oneshot(post_webhook(body)).await.expect("route the request");

        assert_eq!(response.status(), StatusCode::OK);
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn signed_delivery_with_matching_signature_is_accepted() {
        let secret = "webhook-channel-secret";
        let (state, interactions) = seeded_state(Some(SecretString::from(secret))).await;
        let body = delivery_with_texts(&[&format!("meet_{APPROVER_ID}")]);

        let response = router(state)
            .oneshot(signed_post_webhook(body, secret))
            .await
            .expect("route the request");

        assert_eq!(response.status(), StatusCode::OK);
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert_eq!(recorded.len(), 1);
    }

    #[tokio::test]
    async fn signed_delivery_with_wrong_secret_is_unauthorized() {
        let (state, interactions) =
            seeded_state(Some(SecretString::from("webhook-channel-secret"))).await;
        let body = delivery_with_texts(&[&format!("meet_{APPROVER_ID}")]);

        let response = router(state)
            .oneshot(signed_post_webhook(body, "a-different-secret"))
            .await
            .expect("route the request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response_body(response).await, json!({ "status": "unauthorized" }));

        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn missing_signature_header_is_unauthorized() {
        let (state, _interactions) =
            seeded_state(Some(SecretString::from("webhook-channel-secret"))).await;
        let body = delivery_with_texts(&[&format!("meet_{APPROVER_ID}")]);

        let response =
            router(state).oneshot(post_webhook(body)).await.expect("route the request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
