use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Build, Job, Repository};

/// A relation of an entity that points at nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} {id} has no {relation}")]
pub struct UnresolvedRelationship {
    pub entity: &'static str,
    pub id: u64,
    pub relation: &'static str,
}

impl UnresolvedRelationship {
    pub fn new(entity: &'static str, id: u64, relation: &'static str) -> Self {
        Self {
            entity,
            id,
            relation,
        }
    }
}

/// The entity an event is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Subject {
    Build(Build),
    Job(Job),
}

impl Subject {
    pub fn kind(&self) -> &'static str {
        match self {
            Subject::Build(_) => "build",
            Subject::Job(_) => "job",
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Subject::Build(build) => build.id,
            Subject::Job(job) => job.id,
        }
    }

    /// The build itself, or the build a job belongs to
    pub fn owning_build(&self) -> Result<&Build, UnresolvedRelationship> {
        match self {
            Subject::Build(build) => Ok(build),
            Subject::Job(job) => job.owning_build(),
        }
    }

    pub fn repository(&self) -> Result<&Repository, UnresolvedRelationship> {
        self.owning_build()?.owning_repository()
    }
}

impl From<Build> for Subject {
    fn from(build: Build) -> Self {
        Subject::Build(build)
    }
}

impl From<Job> for Subject {
    fn from(job: Job) -> Self {
        Subject::Job(job)
    }
}
