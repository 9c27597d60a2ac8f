//! Build variables and build context lookups.

use serde_json::{Map, Value};

use crate::core::BaseParameters;
use crate::error::{SdkError, SdkResult};

use super::client::{headers, ApiClient, BuildRequest};
use super::envelope::{Endpoint, Payload};

/// The build the variable endpoints address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildScope {
    pub project_name: String,
    pub pipeline_id: String,
    pub build_id: String,
}

impl From<&BaseParameters> for BuildScope {
    fn from(base: &BaseParameters) -> Self {
        Self {
            project_name: base.project_name.clone(),
            pipeline_id: base.pipeline_id.clone(),
            build_id: base.build_id.clone(),
        }
    }
}

impl BuildScope {
    fn apply(&self, build: BuildRequest) -> BuildRequest {
        build
            .header(headers::DEVOPS_BUILD_ID, &self.build_id)
            .header(headers::DEVOPS_PROJECT_ID, &self.project_name)
            .header(headers::DEVOPS_PIPELINE_ID, &self.pipeline_id)
    }
}

impl ApiClient {
    /// All variables of the current build.
    pub fn build_variables(&self) -> SdkResult<Map<String, Value>> {
        let build = self.scope().apply(BuildRequest::get("process/api/build/variable/getBuildVariable"));
        let body = self.call(build, "fail to get build variable")?;
        tracing::debug!("{}", String::from_utf8_lossy(&body));

        Endpoint::BuildVariables.decode(&body).and_then(Payload::into_object).map_err(|e| {
            tracing::error!("fail to unmarshal response message: {}", e);
            e
        })
    }

    /// One build variable.
    ///
    /// Errors only for an empty key or a failed fetch. A key that is absent,
    /// or whose value is not a string, yields `""`.
    pub fn build_variable(&self, key: &str) -> SdkResult<String> {
        if key.is_empty() {
            return Err(SdkError::EmptyKey);
        }

        let vars = self.build_variables()?;
        match vars.get(key).and_then(Value::as_str) {
            Some(value) => Ok(value.to_string()),
            None => {
                tracing::error!("key {} is not exist in map", key);
                Ok(String::new())
            }
        }
    }

    /// Build context value without name validation.
    #[deprecated(note = "use `variable_by_name`")]
    pub fn build_context_by_key(&self, key: &str) -> String {
        self.build_context(key, false)
    }

    /// Build context value by name. `""` on any failure.
    pub fn variable_by_name(&self, name: &str) -> String {
        self.build_context(name, true)
    }

    fn build_context(&self, name: &str, check: bool) -> String {
        let path = format!(
            "process/api/build/variable/get_build_context?contextName={}&check={}",
            urlencoding::encode(name),
            check
        );
        let build = self.scope().apply(BuildRequest::get(path));

        let body = match self.call(build, "fail to get build context") {
            Ok(body) => body,
            Err(_) => return String::new(),
        };
        tracing::debug!("{}", String::from_utf8_lossy(&body));

        Endpoint::BuildContext.decode(&body).and_then(Payload::into_text).unwrap_or_else(|e| {
            tracing::error!("fail to unmarshal response message: {}", e);
            String::new()
        })
    }
}
