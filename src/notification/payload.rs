//! Event-shaped payloads published to the messaging provider.

use serde::Serialize;

use crate::domain::{Attributes, Subject};

use super::{BuildEvent, DispatchError, Extra};

/// Payload for a build event.
///
/// Serializes with keys in declaration order: `build`, `repository`, then
/// `log` for log events only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub build: serde_json::Value,
    pub repository: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl Payload {
    /// Keys of the serialized payload, in order
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["build", "repository"];
        if self.log.is_some() {
            keys.push("log");
        }
        keys
    }
}

/// Build the payload for a build event.
///
/// A job subject is projected through the build it belongs to.
pub fn build_payload(
    event: BuildEvent,
    subject: &Subject,
    extra: &Extra,
) -> Result<Payload, DispatchError> {
    let build = subject.owning_build()?;
    let repository = build.owning_repository()?;

    let log = match event {
        BuildEvent::Log => Some(
            extra
                .log
                .clone()
                .ok_or(DispatchError::MissingExtraField("log"))?,
        ),
        BuildEvent::Queued | BuildEvent::Removed | BuildEvent::Started | BuildEvent::Finished => {
            None
        }
    };

    Ok(Payload {
        build: build.attributes(),
        repository: repository.attributes(),
        log,
    })
}

/// Build the payload for an event given by name
pub fn payload_for(
    event_name: &str,
    subject: &Subject,
    extra: &Extra,
) -> Result<Payload, DispatchError> {
    build_payload(event_name.parse()?, subject, extra)
}
