//! Client for the feed server that crawls repositories into `records`.

use crate::errors::{QueryError, QueryResult};
use crate::models::{CrawlReport, SomeFilesResponse};
use crate::repo::RepoRef;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Asks the feed server to clone or pull `repo` and index its TODO history.
    pub async fn update_repo(&self, repo: &RepoRef) -> QueryResult<CrawlReport> {
        let report: CrawlReport = self.post(&format!("{}/api/update_repo", self.base_url), repo).await?;
        match &report.error {
            Some(error) => warn!("feed server failed to update {repo}: {error}"),
            None => info!(
                "feed server updated {repo}: repo_exist={} new_commits={}",
                report.repo_exist, report.num_new_commit
            ),
        }
        Ok(report)
    }

    /// A handful of file bodies from an already crawled repository.
    pub async fn some_files(&self, repo: &RepoRef) -> QueryResult<Vec<String>> {
        let response: SomeFilesResponse =
            self.post(&format!("{}/api/some_files", self.base_url), repo).await?;
        if let Some(error) = response.error {
            warn!("feed server could not list files of {repo}: {error}");
        }
        Ok(response.files)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str, repo: &RepoRef) -> QueryResult<T> {
        let response = self
            .http
            .post(url)
            .query(&[("org", repo.org.as_str()), ("repo", repo.repo.as_str())])
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .send()
            .await
            .map_err(|source| QueryError::Transport {
                url: url.to_string(),
                source,
            })?;
        decode(url, response).await
    }
}

async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> QueryResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(QueryError::Status {
            url: url.to_string(),
            status,
        });
    }
    response.json().await.map_err(|_| QueryError::Malformed {
        url: url.to_string(),
    })
}
