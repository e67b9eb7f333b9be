use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A GitHub-style `user/repo` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoRef {
    pub org: String,
    pub repo: String,
}

impl RepoRef {
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.trim().split('/');
        let (Some(org), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
            warn!("invalid repo name {input:?}, should be user/repo");
            return None;
        };

        let (org, repo) = (org.trim(), repo.trim());
        if org.is_empty() || repo.is_empty() {
            warn!("invalid repo name {input:?}, should be user/repo");
            return None;
        }

        Some(Self {
            org: org.to_string(),
            repo: repo.to_string(),
        })
    }

    /// The `repo_name` column value the crawler writes for this repository.
    pub fn table_key(&self) -> String {
        format!("{}-{}", self.org, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}
