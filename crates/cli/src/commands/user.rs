use crate::commands::CommandResult;
use meetline_core::config::{AppConfig, LoadOptions};
use meetline_core::domain::user::{LineUserId, User};
use meetline_db::repositories::{RepositoryError, SqlUserRepository, UserRepository};
use meetline_db::{connect, migrations};

pub fn add(line_user_id: &str, display_name: &str, wallet_address: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "user add",
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
                "user add",
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

        let repository = SqlUserRepository::new(pool.clone());
        let mut user = User::new(LineUserId(line_user_id.to_string()), display_name);
        user.wallet_address = wallet_address.map(str::to_string);
        let user_id = user.id.clone();

        let run_result = match repository.save(user).await {
            Ok(()) => Ok(user_id),
            Err(error) if is_unique_violation(&error) => Err((
                "duplicate_line_user_id",
                format!("a user with line user id `{line_user_id}` is already registered"),
                6u8,
            )),
            Err(error) => Err(("db_error", error.to_string(), 4u8)),
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(user_id) => CommandResult::success(
            "user add",
            format!("registered line user `{line_user_id}` with id {}", user_id.0),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("user add", error_class, message, exit_code)
        }
    }
}

pub fn wallet(line_user_id: &str, address: Option<&str>, clear: bool) -> CommandResult {
    if address.is_none() && !clear {
        return CommandResult::failure(
            "user wallet",
            "invalid_arguments",
            "pass --address <ADDRESS> to set a wallet or --clear to remove it",
            6,
        );
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "user wallet",
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
                "user wallet",
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

        let repository = SqlUserRepository::new(pool.clone());
        let run_result =
            match repository.find_by_line_user_id(&LineUserId(line_user_id.to_string())).await {
                Ok(Some(mut user)) => {
                    user.wallet_address =
                        if clear { None } else { address.map(str::to_string) };
                    match repository.update(user).await {
                        Ok(()) => Ok(()),
                        Err(error) => Err(("db_error", error.to_string(), 4u8)),
                    }
                }
                Ok(None) => Err((
                    "user_not_found",
                    format!("no registered user for line user id `{line_user_id}`"),
                    6u8,
                )),
                Err(error) => Err(("db_error", error.to_string(), 4u8)),
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(()) => {
            let message = if clear {
                format!("cleared wallet address for `{line_user_id}`")
            } else {
                format!("updated wallet address for `{line_user_id}`")
            };
            CommandResult::success("user wallet", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("user wallet", error_class, message, exit_code)
        }
    }
}

fn is_unique_violation(error: &RepositoryError) -> bool {
    match error {
        RepositoryError::Database(sqlx::Error::Database(db_error)) => {
            db_error.is_unique_violation()
        }
        _ => false,
    }
}
