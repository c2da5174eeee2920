use crate::commands::CommandResult;
use meetline_core::config::{AppConfig, LoadOptions};
use meetline_core::domain::interaction::{Interaction, InteractionId};
use meetline_core::domain::user::UserId;
use meetline_db::repositories::{InteractionRepository, SqlInteractionRepository};
use meetline_db::{connect, migrations};

pub fn approve(id: &str) -> CommandResult {
    settle("interaction approve", id, true)
}

pub fn reject(id: &str) -> CommandResult {
    settle("interaction reject", id, false)
}

fn settle(command: &str, id: &str, approve: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlInteractionRepository::new(pool.clone());
        let run_result = match repository.find_by_id(&InteractionId(id.to_string())).await {
            Ok(Some(mut interaction)) => {
                let transition =
                    if approve { interaction.approve() } else { interaction.reject() };
                match transition {
                    Ok(()) => match repository.update(interaction).await {
                        Ok(()) => Ok(()),
                        Err(error) => Err(("db_error", error.to_string(), 4u8)),
                    },
                    Err(error) => Err(("invalid_transition", error.to_string(), 6u8)),
                }
            }
            Ok(None) => {
                Err(("interaction_not_found", format!("no interaction with id `{id}`"), 6u8))
            }
            Err(error) => Err(("db_error", error.to_string(), 4u8)),
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(()) => CommandResult::success(
            command,
            format!("interaction {id} {}", if approve { "approved" } else { "rejected" }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

enum Filter {
    Requester(UserId),
    Approver(UserId),
}

pub fn list(requester: Option<&str>, approver: Option<&str>) -> CommandResult {
    let filter = match (requester, approver) {
        (Some(requester_id), None) => Filter::Requester(UserId(requester_id.to_string())),
        (None, Some(approver_id)) => Filter::Approver(UserId(approver_id.to_string())),
        _ => {
            return CommandResult::failure(
                "interaction list",
                "invalid_arguments",
                "pass exactly one of --requester <USER_ID> or --approver <USER_ID>",
                6,
            );
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "interaction list",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "interaction list",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlInteractionRepository::new(pool.clone());
        let run_result = match &filter {
            Filter::Requester(user_id) => repository.find_by_requester_id(user_id).await,
            Filter::Approver(user_id) => repository.find_by_approver_id(user_id).await,
        }
        .map_err(|error| ("db_error", error.to_string(), 4u8));

        pool.close().await;
        run_result
    });

    match result {
        Ok(interactions) => {
            CommandResult::success("interaction list", render_listing(&filter, &interactions))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("interaction list", error_class, message, exit_code)
        }
    }
}

fn render_listing(filter: &Filter, interactions: &[Interaction]) -> String {
    let (role, user_id) = match filter {
        Filter::Requester(user_id) => ("requester", user_id),
        Filter::Approver(user_id) => ("approver", user_id),
    };

    if interactions.is_empty() {
        return format!("no interactions found for {role} {}", user_id.0);
    }

    let mut lines = vec![format!("{} interaction(s) for {role} {}", interactions.len(), user_id.0)];
    for interaction in interactions {
        lines.push(format!(
            "  - {} {} requester={} approver={} created_at={}",
            interaction.id.0,
            interaction.status.as_str(),
            interaction.requester_id.0,
            interaction.approver_id.0,
            interaction.created_at.to_rfc3339(),
        ));
    }

    lines.join("\n")
}
