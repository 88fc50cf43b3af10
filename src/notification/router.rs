//! Queue selection for build events.

use std::fmt;

use crate::domain::Subject;

use super::{BuildEvent, DispatchError};

/// Channel on the messaging provider a payload is published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Queue {
    /// Client-side job list (queued and removed builds)
    Jobs,
    /// Build list (started and finished builds)
    Builds,
    /// Per-build log stream
    BuildLog(u64),
}

impl Queue {
    pub fn name(&self) -> String {
        match self {
            Queue::Jobs => "jobs".to_string(),
            Queue::Builds => "builds".to_string(),
            Queue::BuildLog(build_id) => format!("build-{}", build_id),
        }
    }

    /// Bounded label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Queue::Jobs => "jobs",
            Queue::Builds => "builds",
            Queue::BuildLog(_) => "build_log",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Queue::Jobs => f.write_str("jobs"),
            Queue::Builds => f.write_str("builds"),
            Queue::BuildLog(build_id) => write!(f, "build-{}", build_id),
        }
    }
}

/// Select the queue for a build event.
///
/// Only `build:log` looks at the subject; a job subject is routed by the
/// id of the build it belongs to.
pub fn route(event: BuildEvent, subject: &Subject) -> Result<Queue, DispatchError> {
    let queue = match event {
        BuildEvent::Queued | BuildEvent::Removed => Queue::Jobs,
        BuildEvent::Started | BuildEvent::Finished => Queue::Builds,
        BuildEvent::Log => Queue::BuildLog(subject.owning_build()?.id),
    };
    Ok(queue)
}

/// Select the queue for an event given by name.
///
/// Names without a routing entry, including un-normalized `job:*` names,
/// fail with [`DispatchError::UnroutableEvent`].
pub fn queue_for(event_name: &str, subject: &Subject) -> Result<Queue, DispatchError> {
    route(event_name.parse()?, subject)
}
