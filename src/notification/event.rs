use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Subject;

use super::DispatchError;

/// Every event name the notifier accepts.
///
/// Names outside this set are rejected as unroutable, including `job:*`
/// names other than `job:test:started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum EventKind {
    BuildQueued,
    BuildRemoved,
    BuildStarted,
    BuildFinished,
    BuildLog,
    JobTestStarted,
}

/// Event kinds the queue router and payload builder operate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildEvent {
    Queued,
    Removed,
    Started,
    Finished,
    Log,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::BuildQueued,
        EventKind::BuildRemoved,
        EventKind::BuildStarted,
        EventKind::BuildFinished,
        EventKind::BuildLog,
        EventKind::JobTestStarted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BuildQueued => "build:queued",
            EventKind::BuildRemoved => "build:removed",
            EventKind::BuildStarted => "build:started",
            EventKind::BuildFinished => "build:finished",
            EventKind::BuildLog => "build:log",
            EventKind::JobTestStarted => "job:test:started",
        }
    }

    /// The build event this kind is delivered as.
    ///
    /// `job:test:started` is published exactly like `build:removed` for the
    /// job's build.
    pub fn normalized(&self) -> BuildEvent {
        match self {
            EventKind::BuildQueued => BuildEvent::Queued,
            EventKind::BuildRemoved => BuildEvent::Removed,
            EventKind::BuildStarted => BuildEvent::Started,
            EventKind::BuildFinished => BuildEvent::Finished,
            EventKind::BuildLog => BuildEvent::Log,
            EventKind::JobTestStarted => BuildEvent::Removed,
        }
    }

    /// Whether this kind is a job-namespaced event that needs normalizing
    pub fn is_job_event(&self) -> bool {
        matches!(self, EventKind::JobTestStarted)
    }
}

impl BuildEvent {
    pub fn as_str(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn kind(&self) -> EventKind {
        match self {
            BuildEvent::Queued => EventKind::BuildQueued,
            BuildEvent::Removed => EventKind::BuildRemoved,
            BuildEvent::Started => EventKind::BuildStarted,
            BuildEvent::Finished => EventKind::BuildFinished,
            BuildEvent::Log => EventKind::BuildLog,
        }
    }
}

impl FromStr for EventKind {
    type Err = DispatchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| DispatchError::UnroutableEvent(name.to_string()))
    }
}

impl FromStr for BuildEvent {
    type Err = DispatchError;

    /// Only `build:*` names parse; job events must be normalized first.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let kind: EventKind = name.parse()?;
        if kind.is_job_event() {
            return Err(DispatchError::UnroutableEvent(name.to_string()));
        }
        Ok(kind.normalized())
    }
}

impl TryFrom<String> for EventKind {
    type Error = DispatchError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<EventKind> for &'static str {
    fn from(kind: EventKind) -> Self {
        kind.as_str()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auxiliary data attached to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    /// Log fragment carried by `build:log` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    /// Anything else the publisher of the event attached
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Extra {
    pub fn with_log(log: impl Into<String>) -> Self {
        Self {
            log: Some(log.into()),
            attributes: serde_json::Map::new(),
        }
    }
}

/// A domain event as delivered by the event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub subject: Subject,
    #[serde(default)]
    pub extra: Extra,
}

/// An event rewritten onto the build event it is delivered as
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<'a> {
    pub event: BuildEvent,
    pub subject: Cow<'a, Subject>,
}

impl Event {
    pub fn new(kind: EventKind, subject: impl Into<Subject>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            extra: Extra::default(),
        }
    }

    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Collapse job-namespaced events onto their build event. The effective
    /// subject of a job event is the job's build.
    pub fn normalize(&self) -> Result<Normalized<'_>, DispatchError> {
        let event = self.kind.normalized();

        let subject = match (&self.subject, self.kind.is_job_event()) {
            (Subject::Job(job), true) => Cow::Owned(Subject::Build(job.owning_build()?.clone())),
            (subject, _) => Cow::Borrowed(subject),
        };

        Ok(Normalized { event, subject })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Build, Job, Request};

    #[test]
    fn test_parse_known_names() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let err = "Build:Queued".parse::<EventKind>().unwrap_err();
        assert_eq!(err, DispatchError::UnroutableEvent("Build:Queued".to_string()));
    }

    #[test]
    fn test_unknown_job_event_is_unroutable() {
        assert!(matches!(
            "job:test:finished".parse::<EventKind>(),
            Err(DispatchError::UnroutableEvent(_))
        ));
    }

    #[test]
    fn test_build_event_rejects_job_names() {
        assert!(matches!(
            "job:test:started".parse::<BuildEvent>(),
            Err(DispatchError::UnroutableEvent(name)) if name == "job:test:started"
        ));
        assert_eq!("build:log".parse::<BuildEvent>().unwrap(), BuildEvent::Log);
    }

    #[test]
    fn test_job_test_started_normalizes_to_build_removed_of_owning_build() {
        let build = Build::new(1);
        let job = Job::new(2).with_request(Request::new(3).with_build(build.clone()));
        let event = Event::new(EventKind::JobTestStarted, job);

        let normalized = event.normalize().unwrap();
        assert_eq!(normalized.event, BuildEvent::Removed);
        assert_eq!(normalized.subject.as_ref(), &Subject::Build(build));
    }

    #[test]
    fn test_build_events_keep_their_subject() {
        let event = Event::new(EventKind::BuildStarted, Build::new(1));
        let normalized = event.normalize().unwrap();

        assert_eq!(normalized.event, BuildEvent::Started);
        assert!(matches!(normalized.subject, Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalizing_orphaned_job_fails() {
        let event = Event::new(EventKind::JobTestStarted, Job::new(2));
        assert!(matches!(
            event.normalize(),
            Err(DispatchError::UnresolvableRelationship(_))
        ));
    }

    #[test]
    fn test_event_wire_format() {
        let event: Event = serde_json::from_str(
            r#"{"event": "build:log", "subject": {"type": "build", "id": 1}, "extra": {"log": "foo", "part": 3}}"#,
        )
        .unwrap();

        assert_eq!(event.kind, EventKind::BuildLog);
        assert_eq!(event.extra.log.as_deref(), Some("foo"));
        assert_eq!(event.extra.attributes["part"], 3);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "build:log");
    }

    #[test]
    fn test_unknown_event_name_fails_to_deserialize() {
        let result = serde_json::from_str::<Event>(
            r#"{"event": "build:exploded", "subject": {"type": "build", "id": 1}}"#,
        );
        assert!(result.is_err());
    }
}
