use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Opaque identifier assigned by the LINE platform to a messaging account.
///
/// Distinct from [`UserId`], which is the identifier this service mints when a
/// user registers. Webhook events carry the LINE id; interactions reference the
/// internal one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineUserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub line_user_id: LineUserId,
    pub display_name: String,
    pub wallet_address: Option<String>,
}

impl User {
    /// Creates a newly registered user with a generated internal id and no
    /// wallet address.
    pub fn new(line_user_id: LineUserId, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(Uuid::new_v4().to_string()),
            line_user_id,
            display_name: display_name.into(),
            wallet_address: None,
        }
    }
}
