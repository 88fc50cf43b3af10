use serde::{Deserialize, Serialize};

use super::{Build, UnresolvedRelationship};

/// The request that triggered a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub build: Option<Box<Build>>,
}

/// A unit of work executed on a worker. A job reaches its build through
/// the request that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub request: Option<Request>,
}

impl Request {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            commit: None,
            build: None,
        }
    }

    pub fn with_build(mut self, build: Build) -> Self {
        self.build = Some(Box::new(build));
        self
    }
}

impl Job {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            number: None,
            state: None,
            request: None,
        }
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    /// Build this job belongs to, resolved through its request
    pub fn owning_build(&self) -> Result<&Build, UnresolvedRelationship> {
        let request = self
            .request
            .as_ref()
            .ok_or_else(|| UnresolvedRelationship::new("job", self.id, "request"))?;

        request
            .build
            .as_deref()
            .ok_or_else(|| UnresolvedRelationship::new("request", request.id, "build"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owning_build_through_request() {
        let job = Job::new(3).with_request(Request::new(2).with_build(Build::new(1)));
        assert_eq!(job.owning_build().unwrap().id, 1);
    }

    #[test]
    fn test_job_without_request() {
        let err = Job::new(3).owning_build().unwrap_err();
        assert_eq!((err.entity, err.id, err.relation), ("job", 3, "request"));
    }

    #[test]
    fn test_request_without_build() {
        let err = Job::new(3)
            .with_request(Request::new(2))
            .owning_build()
            .unwrap_err();
        assert_eq!((err.entity, err.id, err.relation), ("request", 2, "build"));
    }
}
