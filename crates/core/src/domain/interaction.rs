use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionId(pub String);

/// Free-form JSON attached to an interaction at recording time.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    Pending,
    Approved,
    Rejected,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Pending => "pending",
            InteractionStatus::Approved => "approved",
            InteractionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(InteractionStatus::Pending),
            "approved" => Some(InteractionStatus::Approved),
            "rejected" => Some(InteractionStatus::Rejected),
            _ => None,
        }
    }
}

/// A recorded request-to-meet between two registered users.
///
/// Interactions start out pending and settle into exactly one of the two
/// terminal states when the approver responds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub requester_id: UserId,
    pub approver_id: UserId,
    pub status: InteractionStatus,
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Creates a fresh pending interaction from the requester toward the
    /// approver.
    pub fn request(requester_id: UserId, approver_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: InteractionId(Uuid::new_v4().to_string()),
            requester_id,
            approver_id,
            status: InteractionStatus::Pending,
            metadata: None,
            created_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InteractionStatus::Pending
    }

    pub fn can_transition_to(&self, next: InteractionStatus) -> bool {
        matches!(
            (self.status, next),
            (InteractionStatus::Pending, InteractionStatus::Approved)
                | (InteractionStatus::Pending, InteractionStatus::Rejected)
        )
    }

    pub fn approve(&mut self) -> Result<(), DomainError> {
        self.transition_to(InteractionStatus::Approved)
    }

    pub fn reject(&mut self) -> Result<(), DomainError> {
        self.transition_to(InteractionStatus::Rejected)
    }

    fn transition_to(&mut self, next: InteractionStatus) -> Result<(), DomainError> {
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
