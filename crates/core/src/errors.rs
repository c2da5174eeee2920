use thiserror::Error;

use crate::domain::interaction::InteractionStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid interaction transition from {from:?} to {to:?}")]
    InvalidStatusTransition {
        from: InteractionStatus,
        to: InteractionStatus,
    },
}
