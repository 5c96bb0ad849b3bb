use crate::error::{RepoIssuesError, Result};
use std::fmt;
use std::str::FromStr;

/// An `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Decode the `repository` route parameter (e.g. `octocat%2FHello-World`).
    ///
    /// An already-decoded `owner/name` passes through unchanged.
    pub fn from_route_param(param: &str) -> Result<Self> {
        let decoded = urlencoding::decode(param).map_err(|e| {
            RepoIssuesError::InvalidRepository(format!("{}: {}", param, e))
        })?;
        decoded.parse()
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = RepoIssuesError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.trim().is_empty() && !name.trim().is_empty() => {
                Ok(RepoId::new(*owner, *name))
            }
            _ => Err(RepoIssuesError::InvalidRepository(format!(
                "expected owner/name, got {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
