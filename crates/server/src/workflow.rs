use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use meetline_core::command::{parse_meet_command, CommandParseError};
use meetline_core::domain::interaction::{Interaction, InteractionId};
use meetline_core::domain::user::{LineUserId, User, UserId};
use meetline_db::repositories::{InteractionRepository, RepositoryError, UserRepository};
use meetline_line::Notifier;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRequestOutcome {
    pub interaction_id: InteractionId,
    pub approver_id: UserId,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    InvalidCommand(#[from] CommandParseError),
    #[error("no registered user for line user id `{0}`")]
    RequesterNotFound(String),
    #[error("no registered approver with id `{0}`")]
    ApproverNotFound(String),
    #[error("requester and approver are the same user")]
    SelfInteraction,
    #[error("participant lookup failed: {0}")]
    Store(#[source] RepositoryError),
    #[error("interaction could not be persisted: {0}")]
    Persistence(#[source] RepositoryError),
}

/// Turns an inbound `meet_{user_id}` message into a recorded interaction.
///
/// The requester is resolved by LINE user id, the approver by internal id,
/// and a pending interaction is persisted before the approver is notified.
/// Notification failure never rolls the interaction back; the approver can
/// still find it through the participant queries.
pub struct InteractionWorkflow {
    users: Arc<dyn UserRepository>,
    interactions: Arc<dyn InteractionRepository>,
    notifier: Arc<dyn Notifier>,
}

impl InteractionWorkflow {
    pub fn new(
        users: Arc<dyn UserRepository>,
        interactions: Arc<dyn InteractionRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { users, interactions, notifier }
    }

    pub async fn request_interaction(
        &self,
        requester_line_user_id: &LineUserId,
        message_text: &str,
    ) -> Result<InteractionRequestOutcome, WorkflowError> {
        let approver_id = parse_meet_command(message_text)?;

        let requester = self
            .users
            .find_by_line_user_id(requester_line_user_id)
            .await
            .map_err(WorkflowError::Store)?
            .ok_or_else(|| WorkflowError::RequesterNotFound(requester_line_user_id.0.clone()))?;

        let approver = self
            .users
            .find_by_id(&approver_id)
            .await
            .map_err(WorkflowError::Store)?
            .ok_or_else(|| WorkflowError::ApproverNotFound(approver_id.0.clone()))?;

        if requester.id == approver.id {
            return Err(WorkflowError::SelfInteraction);
        }

        let interaction =
            Interaction::request(requester.id.clone(), approver.id.clone(), Utc::now());
        let interaction_id = interaction.id.clone();
        self.interactions.save(interaction).await.map_err(WorkflowError::Persistence)?;

        info!(
            event_name = "workflow.interaction.recorded",
            correlation_id = %interaction_id.0,
            interaction_id = %interaction_id.0,
            requester_id = %requester.id.0,
            approver_id = %approver.id.0,
            "interaction request recorded"
        );

        self.notify_approver(&interaction_id, &requester, &approver).await;

        Ok(InteractionRequestOutcome { interaction_id, approver_id: approver.id })
    }

    async fn notify_approver(
        &self,
        interaction_id: &InteractionId,
        requester: &User,
        approver: &User,
    ) {
        let message = format!("{} さんから交流申請が届きました。", requester.display_name);
        if let Err(error) = self.notifier.send_text(&approver.line_user_id, &message).await {
            warn!(
                event_name = "workflow.interaction.notify_failed",
                correlation_id = %interaction_id.0,
                interaction_id = %interaction_id.0,
                approver_id = %approver.id.0,
                error = %error,
                "approver notification failed; interaction remains recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use meetline_core::domain::interaction::{Interaction, InteractionId, InteractionStatus};
    use meetline_core::domain::user::{LineUserId, User, UserId};
    use meetline_db::repositories::{
        InMemoryInteractionRepository, InMemoryUserRepository, InteractionRepository,
        RepositoryError, UserRepository,
    };
    use meetline_line::{Notifier, NotifyError};

    use super::{InteractionWorkflow, WorkflowError};

    const APPROVER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
    const OTHER_ID: &str = "223e4567-e89b-12d3-a456-426614174000";

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sends: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_text(&self, to: &LineUserId, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected {
                    status: 500,
                    detail: "scripted failure".to_string(),
                });
            }
            self.sends.lock().await.push((to.0.clone(), text.to_string()));
            Ok(())
        }

        async fn send_flex(
            &self,
            _to: &LineUserId,
            _alt_text: &str,
            _contents: &serde_json::Value,
        ) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    struct FailingUserStore;

    #[async_trait::async_trait]
    impl UserRepository for FailingUserStore {
        async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn find_by_line_user_id(
            &self,
            _line_user_id: &LineUserId,
        ) -> Result<Option<User>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn save(&self, _user: User) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn update(&self, _user: User) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }
    }

    struct FailingInteractionStore;

    #[async_trait::async_trait]
    impl InteractionRepository for FailingInteractionStore {
        async fn find_by_id(
            &self,
            _id: &InteractionId,
        ) -> Result<Option<Interaction>, RepositoryError> {
            Ok(None)
        }

        async fn find_by_requester_id(
            &self,
            _requester_id: &UserId,
        ) -> Result<Vec<Interaction>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_by_approver_id(
            &self,
            _approver_id: &UserId,
        ) -> Result<Vec<Interaction>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn save(&self, _interaction: Interaction) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn update(&self, _interaction: Interaction) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolClosed))
        }
    }

    fn requester() -> User {
        User {
            id: UserId("R1".to_string()),
            line_user_id: LineUserId("Uexternal1".to_string()),
            display_name: "Alice".to_string(),
            wallet_address: None,
        }
    }

    fn approver() -> User {
        User {
            id: UserId(APPROVER_ID.to_string()),
            line_user_id: LineUserId("Uapprover1".to_string()),
            display_name: "Bob".to_string(),
            wallet_address: None,
        }
    }

    async fn seeded_fixture() -> (
        Arc<InMemoryUserRepository>,
        Arc<InMemoryInteractionRepository>,
        Arc<RecordingNotifier>,
        InteractionWorkflow,
    ) {
        let users = Arc::new(InMemoryUserRepository::default());
        users.save(requester()).await.expect("seed requester");
        users.save(approver()).await.expect("seed approver");

        let interactions = Arc::new(InMemoryInteractionRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let workflow =
            InteractionWorkflow::new(users.clone(), interactions.clone(), notifier.clone());

        (users, interactions, notifier, workflow)
    }

    #[tokio::test]
    async fn meet_command_records_interaction_and_notifies_approver() {
        let (_users, interactions, notifier, workflow) = seeded_fixture().await;
        let started_at = chrono::Utc::now();

        let outcome = workflow
            .request_interaction(
                &LineUserId("Uexternal1".to_string()),
                &format!("  meet_{APPROVER_ID}  "),
            )
            .await
            .expect("request interaction");

        assert_eq!(outcome.approver_id, UserId(APPROVER_ID.to_string()));

        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].id, outcome.interaction_id);
        assert_eq!(recorded[0].requester_id, UserId("R1".to_string()));
        assert_eq!(recorded[0].status, InteractionStatus::Pending);
        assert_eq!(recorded[0].metadata, None);
        assert!(recorded[0].created_at >= started_at);

        let sends = notifier.sends.lock().await;
        assert_eq!(
            *sends,
            vec![("Uapprover1".to_string(), "Alice さんから交流申請が届きました。".to_string())]
        );
    }

    #[tokio::test]
    async fn plain_text_touches_neither_store_nor_notifier() {
        let (_users, interactions, notifier, workflow) = seeded_fixture().await;

        let error = workflow
            .request_interaction(&LineUserId("Uexternal1".to_string()), "hello")
            .await
            .expect_err("plain text is not a command");

        assert!(matches!(error, WorkflowError::InvalidCommand(_)));
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
        assert!(notifier.sends.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unregistered_requester_is_rejected() {
        let (_users, interactions, _notifier, workflow) = seeded_fixture().await;

        let error = workflow
            .request_interaction(
                &LineUserId("Uunknown".to_string()),
                &format!("meet_{APPROVER_ID}"),
            )
            .await
            .expect_err("unknown requester");

        assert!(
            matches!(error, WorkflowError::RequesterNotFound(ref line_id) if line_id == "Uunknown")
        );
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn unregistered_approver_is_rejected() {
        let (_users, interactions, _notifier, workflow) = seeded_fixture().await;

        let error = workflow
            .request_interaction(&LineUserId("Uexternal1".to_string()), &format!("meet_{OTHER_ID}"))
            .await
            .expect_err("unknown approver");

        assert!(matches!(error, WorkflowError::ApproverNotFound(ref id) if id == OTHER_ID));
        let recorded = interactions
            .find_by_requester_id(&UserId("R1".to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn self_interaction_is_rejected_before_any_write() {
        let users = Arc::new(InMemoryUserRepository::default());
        let requester = User {
            id: UserId(APPROVER_ID.to_string()),
            line_user_id: LineUserId("Uself".to_string()),
            display_name: "Mallory".to_string(),
            wallet_address: None,
        };
        users.save(requester).await.expect("seed requester");

        let interactions = Arc::new(InMemoryInteractionRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let workflow =
            InteractionWorkflow::new(users.clone(), interactions.clone(), notifier.clone());

        let error = workflow
            .request_interaction(&LineUserId("Uself".to_string()), &format!("meet_{APPROVER_ID}"))
            .await
            .expect_err("self interaction");

        assert!(matches!(error, WorkflowError::SelfInteraction));
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert!(recorded.is_empty());
        assert!(notifier.sends.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notification_failure_keeps_the_interaction() {
        let users = Arc::new(InMemoryUserRepository::default());
        users.save(requester()).await.expect("seed requester");
        users.save(approver()).await.expect("seed approver");

        let interactions = Arc::new(InMemoryInteractionRepository::default());
        let notifier = Arc::new(RecordingNotifier { fail: true, sends: Mutex::default() });
        let workflow =
            InteractionWorkflow::new(users.clone(), interactions.clone(), notifier.clone());

        let outcome = workflow
            .request_interaction(&LineUserId("Uexternal1".to_string()), &format!("meet_{APPROVER_ID}"))
            .await
            .expect("notification failure is not fatal");

        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].id, outcome.interaction_id);
    }

    #[tokio::test]
    async fn persistence_failure_skips_notification() {
        let users = Arc::new(InMemoryUserRepository::default());
        users.save(requester()).await.expect("seed requester");
        users.save(approver()).await.expect("seed approver");

        let notifier = Arc::new(RecordingNotifier::default());
        let workflow = InteractionWorkflow::new(
            users.clone(),
            Arc::new(FailingInteractionStore),
            notifier.clone(),
        );

        let error = workflow
            .request_interaction(&LineUserId("Uexternal1".to_string()), &format!("meet_{APPROVER_ID}"))
            .await
            .expect_err("save failure");

        assert!(matches!(error, WorkflowError::Persistence(_)));
        assert!(notifier.sends.lock().await.is_empty());
    }

    #[tokio::test]
    async fn user_store_failure_is_distinguished_from_absence() {
        let workflow = InteractionWorkflow::new(
            Arc::new(FailingUserStore),
            Arc::new(InMemoryInteractionRepository::default()),
            Arc::new(RecordingNotifier::default()),
        );

        let error = workflow
            .request_interaction(&LineUserId("Uexternal1".to_string()), &format!("meet_{APPROVER_ID}"))
            .await
            .expect_err("store failure");

        assert!(matches!(error, WorkflowError::Store(_)));
    }

    #[tokio::test]
    async fn repeated_commands_record_separate_interactions() {
        let (_users, interactions, _notifier, workflow) = seeded_fixture().await;
        let line_id = LineUserId("Uexternal1".to_string());
        let text = format!("meet_{APPROVER_ID}");

        let first = workflow.request_interaction(&line_id, &text).await.expect("first request");
        let second = workflow.request_interaction(&line_id, &text).await.expect("second request");

        assert_ne!(first.interaction_id, second.interaction_id);
        let recorded = interactions
            .find_by_approver_id(&UserId(APPROVER_ID.to_string()))
            .await
            .expect("find interactions");
        assert_eq!(recorded.len(), 2);
    }
}
