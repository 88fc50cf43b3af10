use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Attributes;

/// A source repository that owns builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub owner_name: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub last_build_id: Option<u64>,
    #[serde(default)]
    pub last_build_number: Option<String>,
    #[serde(default)]
    pub last_build_status: Option<i32>,
}

impl Repository {
    pub fn new(id: u64, owner_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            owner_name: owner_name.into(),
            name: name.into(),
            url: None,
            last_build_id: None,
            last_build_number: None,
            last_build_status: None,
        }
    }

    /// `owner/name`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner_name, self.name)
    }
}

impl Attributes for Repository {
    fn attributes(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "slug": self.slug(),
            "url": self.url,
            "last_build_id": self.last_build_id,
            "last_build_number": self.last_build_number,
            "last_build_status": self.last_build_status,
        })
    }
}
