// Remote data file fetch
// Reads a file from a GitLab repository through the REST API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://gitlab.com";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitLab API returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("project {0} has no default branch")]
    NoDefaultBranch(String),

    #[error("failed to decode file content: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Deserialize)]
struct Project {
    default_branch: Option<String>,
}

/// `GET /projects/:id/repository/files/:path` response
#[derive(Debug, Deserialize)]
pub struct RepositoryFile {
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl RepositoryFile {
    /// Raw file bytes, base64-decoded when the API says so
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        if self.encoding == "base64" {
            let compact: String = self.content.split_whitespace().collect();
            Ok(BASE64.decode(compact)?)
        } else {
            Ok(self.content.clone().into_bytes())
        }
    }
}

/// Minimal GitLab client for reading repository files
pub struct GitLabClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    /// `host` overrides `gitlab.com`; it is a bare host name such as
    /// `gitlab.example.com`.
    pub fn new(host: Option<&str>, token: impl Into<String>) -> Self {
        let base_url = match host {
            Some(host) if !host.is_empty() => format!("https://{}", host.trim_end_matches('/')),
            _ => DEFAULT_BASE_URL.to_string(),
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_url(&self, repository: &str) -> String {
        format!(
            "{}/api/v4/projects/{}",
            self.base_url,
            urlencoding::encode(repository)
        )
    }

    pub fn file_url(&self, repository: &str, path: &str, git_ref: &str) -> String {
        format!(
            "{}/repository/files/{}?ref={}",
            self.project_url(repository),
            urlencoding::encode(path),
            urlencoding::encode(git_ref)
        )
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        let mut request = self.client.get(&url).header("User-Agent", "pipeline-gen/0.1");
        if !self.token.is_empty() {
            request = request.header("PRIVATE-TOKEN", &self.token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Default branch of `repository`
    pub async fn default_branch(&self, repository: &str) -> Result<String, FetchError> {
        tracing::debug!(repository, "ref is empty, resolving default branch");
        let project: Project = self.get(self.project_url(repository)).await?;
        project
            .default_branch
            .filter(|branch| !branch.is_empty())
            .ok_or_else(|| FetchError::NoDefaultBranch(repository.to_string()))
    }

    /// Read `path` from `repository` at `git_ref`. An empty ref means the
    /// repository's default branch.
    pub async fn fetch_file(
        &self,
        repository: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let git_ref = if git_ref.is_empty() {
            self.default_branch(repository).await?
        } else {
            git_ref.to_string()
        };

        tracing::debug!(repository, path, git_ref = %git_ref, "retrieving file");
        let file: RepositoryFile = self.get(self.file_url(repository, path, &git_ref)).await?;
        file.decode()
    }
}

/// Fetch one repository file: host override, credential, repository, path, ref
pub async fn fetch_file(
    host: Option<&str>,
    token: &str,
    repository: &str,
    path: &str,
    git_ref: &str,
) -> Result<Vec<u8>, FetchError> {
    GitLabClient::new(host, token)
        .fetch_file(repository, path, git_ref)
        .await
}
