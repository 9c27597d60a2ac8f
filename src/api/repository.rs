//! Repository facades: commit history, repository info, git OAuth.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SdkResult;
use crate::serde_ext::null_as_default;

use super::client::{ApiClient, BuildRequest};
use super::envelope::Endpoint;

/// One commit recorded against the current build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitRecord {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub commit_type: i8,
    #[serde(deserialize_with = "null_as_default")]
    pub pipeline_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub build_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub commit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub committer: String,
    /// Unix timestamp in seconds
    #[serde(deserialize_with = "null_as_default")]
    pub commit_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repo_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repo_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub element_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

/// Commits of one checkout step, grouped per repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitGroup {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub element_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub records: Vec<CommitRecord>,
}

/// How a repository is identified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepositorySelector {
    /// Opaque repository hash id
    Id(String),
    /// Human-readable alias
    Name(String),
}

impl RepositorySelector {
    pub fn value(&self) -> &str {
        match self {
            Self::Id(v) | Self::Name(v) => v,
        }
    }

    /// Value of the `repositoryType` query parameter.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "ID",
            Self::Name(_) => "NAME",
        }
    }
}

impl fmt::Display for RepositorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

impl ApiClient {
    /// Commit records of the current build, grouped per repository.
    pub fn commit_history(&self) -> SdkResult<Vec<CommitGroup>> {
        let build = BuildRequest::get("/repository/api/build/commit/getCommitsByBuildId").json_content();
        let body = self.call(build, "fail to get commit history").map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;

        Endpoint::CommitHistory.decode(&body)?.into_commits().map_err(|e| {
            tracing::error!("fail to resolve response message: {}", e);
            e
        })
    }

    /// Repository details. The fields depend on the repository type.
    pub fn repository_info(&self, selector: &RepositorySelector) -> SdkResult<Map<String, Value>> {
        let path = format!(
            "/repository/api/build/repositories/?repositoryId={}&repositoryType={}",
            urlencoding::encode(selector.value()),
            selector.kind()
        );
        self.get_object(Endpoint::RepositoryInfo, &path).map_err(|e| {
            tracing::error!("get git repo info error: {}", e);
            e
        })
    }

    /// Git OAuth token information of a user.
    pub fn git_oauth(&self, user_id: &str) -> SdkResult<Map<String, Value>> {
        let path = format!("/repository/api/build/oauth/git/{}", urlencoding::encode(user_id));
        self.get_object(Endpoint::GitOauth, &path).map_err(|e| {
            tracing::error!("get git oauth error: {}", e);
            e
        })
    }

    fn get_object(&self, endpoint: Endpoint, path: &str) -> SdkResult<Map<String, Value>> {
        let body = self.call(BuildRequest::get(path).json_content(), "fail to get request info")?;
        tracing::debug!("{}", String::from_utf8_lossy(&body));
        endpoint.decode(&body)?.into_object()
    }
}
