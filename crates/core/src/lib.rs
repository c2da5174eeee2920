pub mod command;
pub mod config;
pub mod domain;
pub mod errors;

pub use command::{parse_meet_command, CommandParseError, MEET_PREFIX};
pub use domain::interaction::{Interaction, InteractionId, InteractionStatus, Metadata};
pub use domain::user::{LineUserId, User, UserId};
pub use errors::DomainError;
