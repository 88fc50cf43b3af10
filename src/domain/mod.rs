//! Domain entities as seen by the notifier.
//!
//! Builds, jobs, requests and repositories are owned by the CI core; the
//! notifier only ever reads them. Each entity exposes its own public
//! projection through the [`Attributes`] capability so that payloads never
//! carry internal domain types.

mod build;
mod job;
mod repository;
mod subject;

pub use build::Build;
pub use job::{Job, Request};
pub use repository::Repository;
pub use subject::{Subject, UnresolvedRelationship};

/// Capability of an entity to project itself into a public attribute map.
pub trait Attributes {
    fn attributes(&self) -> serde_json::Value;
}
