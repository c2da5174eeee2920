use std::sync::Arc;
use std::time::Duration;

use meetline_core::config::{AppConfig, ConfigError, LoadOptions};
use meetline_db::repositories::{SqlInteractionRepository, SqlUserRepository};
use meetline_db::{connect, migrations, DbPool};
use meetline_line::{NoopNotifier, Notifier, NotifyError, PushNotifier};
use thiserror::Error;
use tracing::{info, warn};

use crate::webhook::WebhookState;
use crate::workflow::InteractionWorkflow;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub workflow: Arc<InteractionWorkflow>,
}

impl Application {
    pub fn webhook_state(&self) -> WebhookState {
        WebhookState {
            workflow: self.workflow.clone(),
            channel_secret: self.config.line.channel_secret.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notifier initialization failed: {0}")]
    Notifier(#[source] NotifyError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        interaction_id = "unknown",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        interaction_id = "unknown",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        interaction_id = "unknown",
        "database migrations applied"
    );

    let notifier = build_notifier(&config)?;

    if config.line.channel_secret.is_none() {
        warn!(
            event_name = "system.bootstrap.signature_checks_disabled",
            correlation_id = "bootstrap",
            "line.channel_secret is not set; webhook signatures will not be verified"
        );
    }

    let workflow = Arc::new(InteractionWorkflow::new(
        Arc::new(SqlUserRepository::new(db_pool.clone())),
        Arc::new(SqlInteractionRepository::new(db_pool.clone())),
        notifier,
    ));

    Ok(Application { config, db_pool, workflow })
}

fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>, BootstrapError> {
    let Some(token) = config.line.channel_access_token.clone() else {
        warn!(
            event_name = "system.bootstrap.notifier_noop",
            correlation_id = "bootstrap",
            "line.channel_access_token is not set; notifications will be logged instead of pushed"
        );
        return Ok(Arc::new(NoopNotifier));
    };

    let notifier = PushNotifier::new(
        config.line.api_base_url.clone(),
        token,
        Duration::from_secs(config.line.timeout_secs),
    )
    .map_err(BootstrapError::Notifier)?;
    info!(
        event_name = "system.bootstrap.notifier_push",
        correlation_id = "bootstrap",
        api_base_url = %config.line.api_base_url,
        "push notifier initialized"
    );

    Ok(Arc::new(notifier))
}
