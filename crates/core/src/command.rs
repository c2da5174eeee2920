use thiserror::Error;
use uuid::Uuid;

use crate::domain::user::UserId;

/// Prefix a text message must carry to be treated as a meet command.
///
/// Matching is case sensitive; `MEET_x` is an ordinary message.
pub const MEET_PREFIX: &str = "meet_";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("message does not start with `meet_`")]
    MissingPrefix,
    #[error("`{0}` is not a canonical hyphenated UUID")]
    InvalidTargetId(String),
}

/// Parses a `meet_{user_id}` command out of a text message.
///
/// Leading and trailing whitespace is ignored. The target must be a canonical
/// 8-4-4-4-12 UUID; simple, braced, and urn forms are rejected even though the
/// uuid crate accepts them. The id is returned exactly as written, casing
/// included.
pub fn parse_meet_command(message: &str) -> Result<UserId, CommandParseError> {
    let trimmed = message.trim();
    let Some(target) = trimmed.strip_prefix(MEET_PREFIX) else {
        return Err(CommandParseError::MissingPrefix);
    };
    if target.len() != 36 || Uuid::try_parse(target).is_err() {
        return Err(CommandParseError::InvalidTargetId(target.to_string()));
    }
    Ok(UserId(target.to_string()))
}
