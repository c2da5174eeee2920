use std::collections::HashMap;

use tokio::sync::RwLock;

use meetline_core::domain::interaction::{Interaction, InteractionId};
use meetline_core::domain::user::{LineUserId, User, UserId};

use super::{InteractionRepository, RepositoryError, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id.0).cloned())
    }

    async fn find_by_line_user_id(
        &self,
        line_user_id: &LineUserId,
    ) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.line_user_id == *line_user_id).cloned())
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.id.0.clone(), user);
        Ok(())
    }

    async fn update(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.id.0.clone(), user);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryInteractionRepository {
    interactions: RwLock<HashMap<String, Interaction>>,
}

impl InMemoryInteractionRepository {
    async fn find_matching<F>(&self, matches: F) -> Vec<Interaction>
    where
        F: Fn(&Interaction) -> bool,
    {
        let interactions = self.interactions.read().await;
        let mut found: Vec<Interaction> =
            interactions.values().filter(|interaction| matches(interaction)).cloned().collect();
        found.sort_by(|a, b| (a.created_at, &a.id.0).cmp(&(b.created_at, &b.id.0)));
        found
    }
}

#[async_trait::async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn find_by_id(
        &self,
        id: &InteractionId,
    ) -> Result<Option<Interaction>, RepositoryError> {
        let interactions = self.interactions.read().await;
        Ok(interactions.get(&id.0).cloned())
    }

    async fn find_by_requester_id(
        &self,
        requester_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self.find_matching(|interaction| interaction.requester_id == *requester_id).await)
    }

    async fn find_by_approver_id(
        &self,
        approver_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self.find_matching(|interaction| interaction.approver_id == *approver_id).await)
    }

    async fn save(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        let mut interactions = self.interactions.write().await;
        interactions.insert(interaction.id.0.clone(), interaction);
        Ok(())
    }

    async fn update(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        let mut interactions = self.interactions.write().await;
        interactions.insert(interaction.id.0.clone(), interaction);
        Ok(())
    }
}
