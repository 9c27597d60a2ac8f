//! The per-process context an atom runs against.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::lifecycle::{Termination, Verdict};
use super::output::{ErrorType, OutputResult, Status};
use super::params::{BaseParameters, ParameterSet, NO_POST_ACTION};
use super::paths::RuntimePaths;
use super::runtime::RuntimeEnvironment;
use crate::api::{ApiClient, BuildScope, ReqwestTransport, Transport};
use crate::error::SdkResult;

/// Knobs for [`AtomContext::bootstrap`].
#[derive(Clone)]
pub struct BootstrapOptions {
    /// Delete `.sdk.json` once it has been read
    pub remove_secrets_file: bool,

    /// Value of the `--postAction` flag
    pub post_action: String,

    transport: Option<Arc<dyn Transport>>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            remove_secrets_file: false,
            post_action: NO_POST_ACTION.to_string(),
            transport: None,
        }
    }
}

impl fmt::Debug for BootstrapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapOptions")
            .field("remove_secrets_file", &self.remove_secrets_file)
            .field("post_action", &self.post_action)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl BootstrapOptions {
    pub fn remove_secrets_file(mut self, remove: bool) -> Self {
        self.remove_secrets_file = remove;
        self
    }

    pub fn post_action(mut self, post_action: impl Into<String>) -> Self {
        self.post_action = post_action.into();
        self
    }

    /// Use `transport` instead of the default reqwest client.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// Everything an atom needs between start-up and termination.
///
/// Owns the output accumulator; [`AtomContext::finish`] consumes the context,
/// so the result is written at most once.
#[derive(Debug)]
pub struct AtomContext {
    paths: RuntimePaths,
    params: ParameterSet,
    base: BaseParameters,
    output: OutputResult,
    api: ApiClient,
}

impl AtomContext {
    /// Load identity and inputs from the data directory.
    ///
    /// A missing or corrupt secrets or input file cannot be recovered from, so
    /// the error side is a ready-made [`Termination`] with status `error`.
    pub fn bootstrap(paths: &RuntimePaths, options: BootstrapOptions) -> Result<Self, Termination> {
        let env = RuntimeEnvironment::load(&paths.secrets_path(), options.remove_secrets_file)
            .map_err(|e| {
                tracing::error!("read .sdk.json failed: {}", e);
                fatal("read .sdk.json failed")
            })?;

        let (params, mut base) = ParameterSet::load(&paths.input_path())
            .and_then(|params| Ok((params, BaseParameters::load(&paths.input_path())?)))
            .map_err(|e| {
                tracing::error!("init atom base param failed: {}", e);
                fatal("init atom base param failed")
            })?;
        base.post_action_param = options.post_action;

        let transport = match options.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new().map_err(|e| {
                tracing::error!("init http client failed: {}", e);
                fatal("init http client failed")
            })?),
        };

        let api = ApiClient::new(env, transport).with_scope(BuildScope::from(&base));
        Ok(Self::from_parts(paths.clone(), params, base, api))
    }

    /// Assemble a context from already-loaded parts.
    pub fn from_parts(
        paths: RuntimePaths,
        params: ParameterSet,
        base: BaseParameters,
        api: ApiClient,
    ) -> Self {
        Self { paths, params, base, output: OutputResult::new(), api }
    }

    pub fn paths(&self) -> &RuntimePaths {
        &self.paths
    }

    pub fn env(&self) -> &RuntimeEnvironment {
        self.api.env()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// String input parameter, `""` if missing or not a string.
    pub fn input_param(&self, name: &str) -> &str {
        self.params.get_str(name)
    }

    /// The whole input parsed into a plugin-defined struct.
    pub fn load_input<T: DeserializeOwned>(&self) -> SdkResult<T> {
        self.params.deserialize()
    }

    pub fn base(&self) -> &BaseParameters {
        &self.base
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn output(&self) -> &OutputResult {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputResult {
        &mut self.output
    }

    /// Conclude the run with a verdict.
    pub fn finish(self, verdict: Verdict) -> Termination {
        self.output.conclude(verdict)
    }

    pub fn finish_build(self, status: impl Into<Status>, message: impl Into<String>) -> Termination {
        self.finish(Verdict::new(status, message))
    }

    pub fn finish_build_with_error_code(
        self,
        status: impl Into<Status>,
        message: impl Into<String>,
        error_code: i64,
    ) -> Termination {
        self.finish(Verdict::new(status, message).with_error_code(error_code))
    }

    pub fn finish_build_with_error(
        self,
        status: impl Into<Status>,
        message: impl Into<String>,
        error_code: i64,
        error_type: ErrorType,
    ) -> Termination {
        self.finish(Verdict::new(status, message).with_error(error_code, error_type))
    }
}

fn fatal(message: &str) -> Termination {
    OutputResult::new().conclude(Verdict::fatal(message))
}
