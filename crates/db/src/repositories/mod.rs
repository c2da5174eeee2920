use async_trait::async_trait;
use thiserror::Error;

use meetline_core::domain::interaction::{Interaction, InteractionId};
use meetline_core::domain::user::{LineUserId, User, UserId};

pub mod interaction;
pub mod memory;
pub mod user;

pub use interaction::SqlInteractionRepository;
pub use memory::{InMemoryInteractionRepository, InMemoryUserRepository};
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_line_user_id(
        &self,
        line_user_id: &LineUserId,
    ) -> Result<Option<User>, RepositoryError>;

    async fn save(&self, user: User) -> Result<(), RepositoryError>;

    async fn update(&self, user: User) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn find_by_id(&self, id: &InteractionId)
        -> Result<Option<Interaction>, RepositoryError>;

    async fn find_by_requester_id(
        &self,
        requester_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError>;

    async fn find_by_approver_id(
        &self,
        approver_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError>;

    async fn save(&self, interaction: Interaction) -> Result<(), RepositoryError>;

    async fn update(&self, interaction: Interaction) -> Result<(), RepositoryError>;
}
