//! The `{status, data}` wrapper every gateway response uses, and the
//! per-endpoint narrowing of `data`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SdkError, SdkResult};
use crate::serde_ext::null_string_map;

use super::repository::CommitGroup;

/// Raw response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub data: Value,
}

/// String-valued object where `null` values read as `""`.
#[derive(Deserialize)]
#[serde(transparent)]
struct StringFields(#[serde(deserialize_with = "null_string_map")] HashMap<String, String>);

/// Gateway calls with a documented `data` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CommitHistory,
    RepositoryInfo,
    GitOauth,
    Credential,
    BuildVariables,
    BuildContext,
}

impl Endpoint {
    pub const fn name(self) -> &'static str {
        match self {
            Self::CommitHistory => "commit history",
            Self::RepositoryInfo => "repository info",
            Self::GitOauth => "git oauth",
            Self::Credential => "credential",
            Self::BuildVariables => "build variables",
            Self::BuildContext => "build context",
        }
    }

    /// Shape `data` must have for this endpoint.
    pub const fn expected(self) -> &'static str {
        match self {
            Self::CommitHistory => "array of commit groups",
            Self::RepositoryInfo | Self::GitOauth | Self::BuildVariables => "object",
            Self::Credential => "object of strings",
            Self::BuildContext => "string",
        }
    }

    fn violation(self) -> SdkError {
        SdkError::Contract { endpoint: self.name(), expected: self.expected() }
    }

    /// Parse a response body and narrow its `data` to this endpoint's shape.
    pub fn decode(self, body: &[u8]) -> SdkResult<Payload> {
        let envelope: ApiEnvelope = serde_json::from_slice(body)?;
        self.narrow(envelope.data)
    }

    fn narrow(self, data: Value) -> SdkResult<Payload> {
        match (self, data) {
            (Self::CommitHistory, Value::Null) => Ok(Payload::Commits(Vec::new())),
            (Self::CommitHistory, data @ Value::Array(_)) => serde_json::from_value(data)
                .map(Payload::Commits)
                .map_err(|_| self.violation()),
            (Self::RepositoryInfo | Self::GitOauth | Self::BuildVariables, Value::Object(map)) => {
                Ok(Payload::Object(map))
            }
            (Self::Credential, Value::Null) => Ok(Payload::Strings(HashMap::new())),
            (Self::Credential, data @ Value::Object(_)) => serde_json::from_value(data)
                .map(|StringFields(fields)| Payload::Strings(fields))
                .map_err(|_| self.violation()),
            (Self::BuildContext, Value::String(s)) => Ok(Payload::Text(s)),
            _ => Err(self.violation()),
        }
    }
}

/// `data` narrowed to the shape its endpoint documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Commits(Vec<CommitGroup>),
    Object(Map<String, Value>),
    Strings(HashMap<String, String>),
    Text(String),
}

impl Payload {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Commits(_) => "commit groups",
            Self::Object(_) => "object",
            Self::Strings(_) => "object of strings",
            Self::Text(_) => "string",
        }
    }

    fn mismatch(&self, expected: &'static str) -> SdkError {
        SdkError::Contract { endpoint: self.kind(), expected }
    }

    pub fn into_commits(self) -> SdkResult<Vec<CommitGroup>> {
        match self {
            Self::Commits(groups) => Ok(groups),
            other => Err(other.mismatch("commit groups")),
        }
    }

    pub fn into_object(self) -> SdkResult<Map<String, Value>> {
        match self {
            Self::Object(map) => Ok(map),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn into_strings(self) -> SdkResult<HashMap<String, String>> {
        match self {
            Self::Strings(map) => Ok(map),
            other => Err(other.mismatch("object of strings")),
        }
    }

    pub fn into_text(self) -> SdkResult<String> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}
