//! Plugin input parameters.
//!
//! The input file is a single JSON object. Its keys are the parameters the
//! plugin author declared, plus a reserved set of base parameters the CI
//! worker injects into every atom.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SdkError, SdkResult};
use crate::serde_ext::{null_as_default, null_string_map};

/// Value the post action parameter takes when no flag is given.
pub const NO_POST_ACTION: &str = "noPostAction";

/// Declared input parameters, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: Map<String, Value>,
}

impl ParameterSet {
    /// Read the input file as an open key/value mapping.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let data = std::fs::read(path).map_err(|e| SdkError::io(path, e))?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Raw value of a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of a parameter, or `""` if it is missing or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        self.values.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// Parameter coerced into `T`. Coercion failures yield `None`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(|v| T::deserialize(v).ok())
    }

    /// Deserialize the whole input into a plugin-defined struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SdkResult<T> {
        Ok(T::deserialize(Value::Object(self.values.clone()))?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Fixed identifiers the CI worker injects into every input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseParameters {
    #[serde(rename = "BK_CI_PIPELINE_VERSION", deserialize_with = "null_as_default")]
    pub pipeline_version: String,

    #[serde(rename = "BK_CI_PROJECT_NAME", deserialize_with = "null_as_default")]
    pub project_name: String,

    #[serde(rename = "BK_CI_PROJECT_NAME_CN", deserialize_with = "null_as_default")]
    pub project_name_cn: String,

    #[serde(rename = "BK_CI_PIPELINE_ID", deserialize_with = "null_as_default")]
    pub pipeline_id: String,

    #[serde(rename = "BK_CI_BUILD_NUM", deserialize_with = "null_as_default")]
    pub build_num: String,

    #[serde(rename = "BK_CI_BUILD_ID", deserialize_with = "null_as_default")]
    pub build_id: String,

    #[serde(rename = "BK_CI_PIPELINE_NAME", deserialize_with = "null_as_default")]
    pub pipeline_name: String,

    #[serde(rename = "BK_CI_BUILD_START_TIME", deserialize_with = "null_as_default")]
    pub start_time_millis: String,

    #[serde(rename = "BK_CI_START_TYPE", deserialize_with = "null_as_default")]
    pub start_type: String,

    #[serde(rename = "BK_CI_START_USER_ID", deserialize_with = "null_as_default")]
    pub start_user_id: String,

    #[serde(rename = "BK_CI_START_USER_NAME", deserialize_with = "null_as_default")]
    pub start_user_name: String,

    #[serde(rename = "bkWorkspace", deserialize_with = "null_as_default")]
    pub workspace: String,

    #[serde(rename = "BK_CI_PIPELINE_CREATE_USER", deserialize_with = "null_as_default")]
    pub create_user: String,

    #[serde(rename = "BK_CI_PIPELINE_UPDATE_USER", deserialize_with = "null_as_default")]
    pub modify_user: String,

    /// Sensitive plugin configuration, never echoed to logs
    #[serde(rename = "bkSensitiveConfInfo", deserialize_with = "null_string_map")]
    pub sensitive_config: HashMap<String, String>,

    #[serde(rename = "postEntryParam", deserialize_with = "null_as_default")]
    pub post_action_param: String,

    #[serde(rename = "testVersionFlag", deserialize_with = "null_as_default")]
    pub test_version_flag: String,

    #[serde(rename = "BK_CI_BUILD_TASK_ID", deserialize_with = "null_as_default")]
    pub task_id: String,

    #[serde(rename = "BK_CI_ATOM_CODE", deserialize_with = "null_as_default")]
    pub atom_code: String,

    #[serde(rename = "BK_CI_ATOM_NAME", deserialize_with = "null_as_default")]
    pub atom_name: String,

    #[serde(rename = "BK_CI_ATOM_VERSION", deserialize_with = "null_as_default")]
    pub atom_version: String,

    #[serde(rename = "BK_CI_TASK_NAME", deserialize_with = "null_as_default")]
    pub task_name: String,

    #[serde(rename = "BK_CI_STEP_ID", deserialize_with = "null_as_default")]
    pub step_id: String,
}

impl BaseParameters {
    /// Read the reserved keys of the input file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let data = std::fs::read(path).map_err(|e| SdkError::io(path, e))?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Workspace directory, `.` when the worker did not provide one.
    pub fn workspace(&self) -> &str {
        if self.workspace.is_empty() {
            "."
        } else {
            &self.workspace
        }
    }

    /// Sensitive config entry, or `""` when absent.
    pub fn sensitive_param(&self, field: &str) -> &str {
        self.sensitive_config.get(field).map_or("", String::as_str)
    }
}
