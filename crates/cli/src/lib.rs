pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "meetline",
    about = "Meetline operator CLI",
    long_about = "Operate Meetline database migrations, readiness checks, user registration, and interaction review.",
    after_help = "Examples:\n  meetline migrate\n  meetline doctor --json\n  meetline user add --line-user-id U4af4980629 --display-name \"Alice\"\n  meetline interaction list --approver 123e4567-e89b-12d3-a456-426614174000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Validate config, LINE credential posture, and database readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Register and maintain LINE users")]
    User(UserCommand),
    #[command(subcommand, about = "Review and settle recorded interactions")]
    Interaction(InteractionCommand),
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    #[command(about = "Register a user under their LINE user id")]
    Add {
        #[arg(long, help = "LINE platform user id of the new user")]
        line_user_id: String,
        #[arg(long, help = "Name shown to approvers in notifications")]
        display_name: String,
        #[arg(long, help = "Optional wallet address to store alongside the profile")]
        wallet_address: Option<String>,
    },
    #[command(about = "Set or clear the wallet address of a registered user")]
    Wallet {
        #[arg(long, help = "LINE platform user id of the registered user")]
        line_user_id: String,
        #[arg(long, conflicts_with = "clear", help = "Wallet address to set")]
        address: Option<String>,
        #[arg(long, help = "Remove the stored wallet address")]
        clear: bool,
    },
}

#[derive(Debug, Subcommand)]
enum InteractionCommand {
    #[command(about = "Approve a pending interaction")]
    Approve {
        #[arg(help = "Interaction id")]
        id: String,
    },
    #[command(about = "Reject a pending interaction")]
    Reject {
        #[arg(help = "Interaction id")]
        id: String,
    },
    #[command(about = "List interactions in which a user participates")]
    List {
        #[arg(long, conflicts_with = "approver", help = "Filter by requester user id")]
        requester: Option<String>,
        #[arg(long, help = "Filter by approver user id")]
        approver: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::User(command) => match command {
            UserCommand::Add { line_user_id, display_name, wallet_address } => {
                commands::user::add(&line_user_id, &display_name, wallet_address.as_deref())
            }
            UserCommand::Wallet { line_user_id, address, clear } => {
                commands::user::wallet(&line_user_id, address.as_deref(), clear)
            }
        },
        Command::Interaction(command) => match command {
            InteractionCommand::Approve { id } => commands::interaction::approve(&id),
            InteractionCommand::Reject { id } => commands::interaction::reject(&id),
            InteractionCommand::List { requester, approver } => {
                commands::interaction::list(requester.as_deref(), approver.as_deref())
            }
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
