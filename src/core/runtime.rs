//! Runtime identity descriptor loaded from `.sdk.json`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};
use crate::serde_ext::null_as_default;

/// Kind of machine the worker runs the build on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildType {
    Worker,
    Agent,
    PluginAgent,
    Docker,
    DockerHost,
    TstackAgent,
}

impl BuildType {
    pub const ALL: [Self; 6] = [
        Self::Worker,
        Self::Agent,
        Self::PluginAgent,
        Self::Docker,
        Self::DockerHost,
        Self::TstackAgent,
    ];

    /// Value of `buildType` in `.sdk.json`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "WORKER",
            Self::Agent => "AGENT",
            Self::PluginAgent => "PLUGIN_AGENT",
            Self::Docker => "DOCKER",
            Self::DockerHost => "DOCKER_HOST",
            Self::TstackAgent => "TSTACK_AGENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and gateway information handed to the atom by the CI worker.
///
/// Every outbound call is authenticated with headers derived from this struct.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeEnvironment {
    #[serde(deserialize_with = "null_as_default")]
    pub build_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub agent_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub secret_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gateway: String,
    #[serde(deserialize_with = "null_as_default")]
    pub build_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub vm_seq_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub task_id: String,
}

impl RuntimeEnvironment {
    /// Parse the descriptor from the secrets file.
    ///
    /// When `remove_after_read` is set the file is deleted once parsed. A failed
    /// removal is logged and otherwise ignored.
    pub fn load(path: &Path, remove_after_read: bool) -> SdkResult<Self> {
        let data = std::fs::read(path).map_err(|e| SdkError::io(path, e))?;
        let env: Self = serde_json::from_slice(&data)?;

        if remove_after_read {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("remove {} failed: {}", path.display(), e);
            }
        }

        Ok(env)
    }

    /// Known build type, `None` for values this SDK does not list.
    ///
    /// `build_type` itself stays a string and is sent verbatim in headers.
    pub fn kind(&self) -> Option<BuildType> {
        BuildType::parse(&self.build_type)
    }

    /// Whether outbound calls can be addressed at all.
    pub fn has_gateway(&self) -> bool {
        !self.gateway.trim().is_empty()
    }
}

impl fmt::Debug for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeEnvironment")
            .field("build_type", &self.build_type)
            .field("project_id", &self.project_id)
            .field("agent_id", &self.agent_id)
            .field("secret_key", &"***")
            .field("gateway", &self.gateway)
            .field("build_id", &self.build_id)
            .field("vm_seq_id", &self.vm_seq_id)
            .field("task_id", &self.task_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SDK_JSON: &str = r#"{
        "buildType": "DOCKER",
        "projectId": "demo",
        "agentId": "agent-1",
        "secretKey": "s3cr3t",
        "gateway": "devops.example.com",
        "buildId": "b-42",
        "vmSeqId": "1",
        "taskId": "e-7"
    }"#;

    #[test]
    fn test_load_parses_all_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sdk.json");
        std::fs::write(&path, SDK_JSON).unwrap();

        let env = RuntimeEnvironment::load(&path, false).unwrap();
        assert_eq!(env.build_type, "DOCKER");
        assert_eq!(env.project_id, "demo");
        assert_eq!(env.secret_key, "s3cr3t");
        assert_eq!(env.vm_seq_id, "1");
        assert_eq!(env.task_id, "e-7");
        assert!(env.has_gateway());
        assert!(path.exists());
    }

    #[test]
    fn test_load_can_consume_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sdk.json");
        std::fs::write(&path, SDK_JSON).unwrap();

        RuntimeEnvironment::load(&path, true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sdk.json");
        std::fs::write(&path, r#"{"buildId": "b-1"}"#).unwrap();

        let env = RuntimeEnvironment::load(&path, false).unwrap();
        assert_eq!(env.build_id, "b-1");
        assert!(!env.has_gateway());
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sdk.json");
        std::fs::write(&path, r#"{"buildId":"b-1","vmSeqId":null,"taskId":null,"gateway":null}"#)
            .unwrap();

        let env = RuntimeEnvironment::load(&path, false).unwrap();
        assert_eq!(env.build_id, "b-1");
        assert_eq!(env.vm_seq_id, "");
        assert!(!env.has_gateway());
    }

    #[test]
    fn test_build_type_kind() {
        let env = RuntimeEnvironment { build_type: "DOCKER_HOST".into(), ..Default::default() };
        assert_eq!(env.kind(), Some(BuildType::DockerHost));

        let env = RuntimeEnvironment { build_type: "MACOS".into(), ..Default::default() };
        assert_eq!(env.kind(), None);

        for kind in BuildType::ALL {
            assert_eq!(BuildType::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join(".sdk.json");
        assert!(matches!(RuntimeEnvironment::load(&missing, false), Err(SdkError::Io { .. })));

        std::fs::write(&missing, "not json").unwrap();
        assert!(matches!(RuntimeEnvironment::load(&missing, false), Err(SdkError::Json(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let env = RuntimeEnvironment { secret_key: "s3cr3t".into(), ..Default::default() };
        let rendered = format!("{env:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("***"));
    }
}
