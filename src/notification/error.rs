use thiserror::Error;

use crate::domain::UnresolvedRelationship;
use crate::publisher::PublishError;

/// Errors raised while turning an event into a queue and a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("No queue is mapped for event {0:?}")]
    UnroutableEvent(String),

    #[error("Event is missing required extra field {0:?}")]
    MissingExtraField(&'static str),

    #[error("Cannot resolve relationship: {0}")]
    UnresolvableRelationship(#[from] UnresolvedRelationship),
}

impl DispatchError {
    /// Short label used for metrics and API error codes
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnroutableEvent(_) => "unroutable_event",
            DispatchError::MissingExtraField(_) => "missing_extra_field",
            DispatchError::UnresolvableRelationship(_) => "unresolvable_relationship",
        }
    }
}

/// Errors surfaced by the pusher notifier
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
