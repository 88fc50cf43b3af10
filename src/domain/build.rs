use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Attributes, Repository, UnresolvedRelationship};

/// A build of a repository at a given commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: u64,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Build configuration as parsed from the repository (matrix axes etc.)
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Accumulated log output, when the core keeps it on the build
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
}

impl Build {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            number: None,
            state: None,
            config: serde_json::Value::Null,
            commit: None,
            branch: None,
            message: None,
            status: None,
            started_at: None,
            finished_at: None,
            log: None,
            repository: None,
        }
    }

    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Repository this build belongs to
    pub fn owning_repository(&self) -> Result<&Repository, UnresolvedRelationship> {
        self.repository
            .as_ref()
            .ok_or_else(|| UnresolvedRelationship::new("build", self.id, "repository"))
    }
}

impl Attributes for Build {
    fn attributes(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "repository_id": self.repository.as_ref().map(|r| r.id),
            "number": self.number,
            "state": self.state,
            "config": self.config,
            "commit": self.commit,
            "branch": self.branch,
            "message": self.message,
            "status": self.status,
            "started_at": self.started_at,
            "finished_at": self.finished_at,
        })
    }
}
