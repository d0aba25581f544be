//! HTTP client for the GitLab REST v4 API.

use crate::types::{Bridge, Commit, Job, Pipeline, ProjectId};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Page size for paginated list endpoints.
const PER_PAGE: usize = 100;

#[derive(Error, Debug)]
pub enum GitLabError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitLab API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to decode GitLab response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid GitLab URL: {0}")]
    InvalidUrl(String),
    #[error("Job not found: {0}")]
    JobNotFound(String),
    #[error("Failed to write job trace: {0}")]
    Io(#[from] std::io::Error),
}

/// Thin GitLab REST client.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<String>,
}

impl GitLabClient {
    /// Create a client for the GitLab instance at `host` (e.g. `https://gitlab.com`).
    pub fn new(host: &str, token: Option<String>) -> Result<Self, GitLabError> {
        let client = Client::builder()
            .user_agent(concat!("ciview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base = Url::parse(host).map_err(|e| GitLabError::InvalidUrl(format!("{host}: {e}")))?;
        let api_url = base
            .join("api/v4/")
            .map_err(|e| GitLabError::InvalidUrl(format!("{host}: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Build `<api>/projects/<project>/<segments...>`, percent-encoding the project path.
    pub(crate) fn project_url(
        &self,
        project: &ProjectId,
        segments: &[&str],
    ) -> Result<Url, GitLabError> {
        let mut url = self.api_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GitLabError::InvalidUrl(self.api_url.to_string()))?;
            path.pop_if_empty()
                .push("projects")
                .push(&project.to_string())
                .extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("PRIVATE-TOKEN", token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, GitLabError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(GitLabError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitLabError> {
        tracing::debug!("GET {}", url);
        let response = self.authorize(self.client.get(url)).send().await?;
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitLabError> {
        tracing::debug!("POST {}", url);
        let response = self.authorize(self.client.post(url)).send().await?;
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, GitLabError> {
        tracing::debug!("GET {}", url);
        let response = self.authorize(self.client.get(url)).send().await?;
        Ok(Self::check(response).await?.bytes().await?.to_vec())
    }

    /// Collect every page of a list endpoint, following `x-next-page`.
    pub(crate) async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Vec<T>, GitLabError> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            tracing::debug!("GET {}", page_url);
            let response = self.authorize(self.client.get(page_url)).send().await?;
            let response = Self::check(response).await?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let body = response.text().await?;
            let mut batch: Vec<T> = serde_json::from_str(&body)?;
            items.append(&mut batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }

    /// Resolve a branch, tag or SHA to a commit.
    pub async fn commit(&self, project: &ProjectId, ref_name: &str) -> Result<Commit, GitLabError> {
        let url = self.project_url(project, &["repository", "commits", ref_name])?;
        self.get_json(url).await
    }

    /// Fetch a single pipeline.
    pub async fn pipeline(
        &self,
        project: &ProjectId,
        pipeline_id: u64,
    ) -> Result<Pipeline, GitLabError> {
        let url = self.project_url(project, &["pipelines", &pipeline_id.to_string()])?;
        self.get_json(url).await
    }

    /// List the pipelines that ran for a commit SHA, most recent first.
    pub async fn pipelines_for_sha(
        &self,
        project: &ProjectId,
        sha: &str,
    ) -> Result<Vec<Pipeline>, GitLabError> {
        let mut url = self.project_url(project, &["pipelines"])?;
        url.query_pairs_mut()
            .append_pair("sha", sha)
            .append_pair("per_page", "30");
        self.get_json(url).await
    }

    /// List jobs of a pipeline, in creation order.
    pub async fn list_pipeline_jobs(
        &self,
        project: &ProjectId,
        pipeline_id: u64,
    ) -> Result<Vec<Job>, GitLabError> {
        let url = self.project_url(project, &["pipelines", &pipeline_id.to_string(), "jobs"])?;
        let mut jobs: Vec<Job> = self.get_paginated(url).await?;
        // The API lists newest first; restore creation order.
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    /// List bridge jobs of a pipeline, in creation order.
    pub async fn list_pipeline_bridges(
        &self,
        project: &ProjectId,
        pipeline_id: u64,
    ) -> Result<Vec<Bridge>, GitLabError> {
        let url = self.project_url(
            project,
            &["pipelines", &pipeline_id.to_string(), "bridges"],
        )?;
        let mut bridges: Vec<Bridge> = self.get_paginated(url).await?;
        bridges.sort_by_key(|b| b.created_at);
        Ok(bridges)
    }
}
