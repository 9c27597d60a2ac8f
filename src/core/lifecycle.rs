//! The single exit path of an atom.
//!
//! Concluding a run is split in two: [`OutputResult::conclude`] is pure and
//! yields a [`Termination`] (serialized result plus exit code), and only
//! [`Termination::exit`] touches the filesystem and ends the process.

use std::path::Path;

use clap::Parser;

use super::context::{AtomContext, BootstrapOptions};
use super::output::{ErrorType, OutputResult, Status};
use super::paths::RuntimePaths;
use crate::cli::AtomArgs;
use crate::error::{SdkError, SdkResult};

/// Error code reported when the runtime itself cannot start.
pub const FATAL_ERROR_CODE: i64 = 2189503;

/// Process exit code for a status. Unknown statuses exit 0.
pub fn exit_code(status: &Status) -> i32 {
    match status {
        Status::Success => 0,
        Status::Failure => 1,
        Status::Error => 2,
        Status::Other(_) => 0,
    }
}

/// The outcome an atom reports when it is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
    pub error_code: Option<i64>,
    pub error_type: Option<ErrorType>,
}

impl Verdict {
    /// Finish with a status and message.
    pub fn new(status: impl Into<Status>, message: impl Into<String>) -> Self {
        Self { status: status.into(), message: message.into(), error_code: None, error_type: None }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Success, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(Status::Failure, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    /// Finish with a status, message and error code.
    pub fn with_error_code(mut self, code: i64) -> Self {
        self.error_code = Some(code);
        self
    }

    /// Finish with a status, message, error code and error type.
    pub fn with_error(mut self, code: i64, error_type: ErrorType) -> Self {
        self.error_code = Some(code);
        self.error_type = Some(error_type);
        self
    }

    /// Verdict for a runtime that could not start.
    pub(crate) fn fatal(message: impl Into<String>) -> Self {
        Self::error(message).with_error(FATAL_ERROR_CODE, ErrorType::Plugin)
    }
}

/// A concluded run, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    /// Serialized output file content
    pub payload: String,
    pub exit_code: i32,
}

impl OutputResult {
    /// Apply the verdict and serialize the result.
    ///
    /// Consumes the accumulator, so a run can only be concluded once.
    pub fn conclude(mut self, verdict: Verdict) -> Termination {
        self.status = verdict.status;
        self.message = verdict.message;
        if let Some(code) = verdict.error_code {
            self.error_code = code;
        }
        if let Some(error_type) = verdict.error_type {
            self.error_type = Some(error_type);
        }

        let exit_code = exit_code(&self.status);
        // Data values are already `serde_json::Value`, so this cannot fail in practice.
        let payload = serde_json::to_string(&self).unwrap_or_else(|e| {
            tracing::error!("serialize output failed: {}", e);
            String::new()
        });

        Termination { payload, exit_code }
    }
}

impl Termination {
    /// Write the result file, replacing any previous content.
    pub fn persist(&self, path: &Path) -> SdkResult<()> {
        std::fs::write(path, &self.payload).map_err(|e| {
            tracing::error!("write output failed: {}", e);
            SdkError::io(path, e)
        })
    }

    /// Persist and end the process.
    ///
    /// The exit code depends only on the status, never on whether the write
    /// succeeded.
    pub fn exit(self, path: &Path) -> ! {
        let _ = self.persist(path);
        std::process::exit(self.exit_code)
    }
}

/// Bootstrap the runtime and run the plugin body, without exiting.
pub fn execute<F>(paths: &RuntimePaths, options: BootstrapOptions, plugin: F) -> Termination
where
    F: FnOnce(&mut AtomContext) -> Verdict,
{
    match AtomContext::bootstrap(paths, options) {
        Ok(mut ctx) => {
            let verdict = plugin(&mut ctx);
            ctx.finish(verdict)
        }
        Err(termination) => termination,
    }
}

/// Entry point for an atom binary.
///
/// Installs logging, reads flags and environment, runs `plugin` and exits
/// with the status-derived code.
pub fn run<F>(plugin: F) -> !
where
    F: FnOnce(&mut AtomContext) -> Verdict,
{
    crate::log::init();
    let args = AtomArgs::parse();
    let paths = RuntimePaths::from_env();
    let options = BootstrapOptions::default().post_action(args.post_action);

    execute(&paths, options, plugin).exit(&paths.output_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::QualityDatum;
    use tempfile::TempDir;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(&Status::Success), 0);
        assert_eq!(exit_code(&Status::Failure), 1);
        assert_eq!(exit_code(&Status::Error), 2);
        assert_eq!(exit_code(&Status::from("skipped")), 0);
    }

    #[test]
    fn test_conclude_applies_verdict() {
        let termination = OutputResult::new()
            .conclude(Verdict::failure("tests failed").with_error(1001, ErrorType::User));
        assert_eq!(termination.exit_code, 1);

        let parsed: OutputResult = serde_json::from_str(&termination.payload).unwrap();
        assert_eq!(parsed.status, Status::Failure);
        assert_eq!(parsed.message, "tests failed");
        assert_eq!(parsed.error_code, 1001);
        assert_eq!(parsed.error_type, Some(ErrorType::User));
    }

    #[test]
    fn test_conclude_keeps_unset_codes() {
        let mut output = OutputResult::new();
        output.error_code = 7;
        let termination = output.conclude(Verdict::error("boom").with_error_code(9));
        let parsed: OutputResult = serde_json::from_str(&termination.payload).unwrap();
        assert_eq!(parsed.error_code, 9);
        assert_eq!(parsed.error_type, None);
        assert_eq!(termination.exit_code, 2);
    }

    #[test]
    fn test_persist_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.json");
        std::fs::write(&path, "stale content that is longer than the result").unwrap();

        let mut output = OutputResult::new();
        output.add_quality_data("coverage", QualityDatum::new("87"));
        let termination = output.conclude(Verdict::success("done"));
        termination.persist(&path).unwrap();

        let parsed: OutputResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.message, "done");
        assert_eq!(parsed.get_quality_data("coverage").unwrap().value, "87");
    }

    #[test]
    fn test_persist_twice_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.json");

        let first = OutputResult::new().conclude(Verdict::success("first"));
        first.persist(&path).unwrap();
        first.persist(&path).unwrap();

        let parsed: OutputResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.message, "first");
    }

    #[test]
    fn test_persist_failure_keeps_exit_code() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("output.json");

        let termination = OutputResult::new().conclude(Verdict::failure("nope"));
        assert!(termination.persist(&path).is_err());
        assert_eq!(termination.exit_code, 1);
    }

    #[test]
    fn test_fatal_verdict() {
        let termination = OutputResult::new().conclude(Verdict::fatal("read .sdk.json failed"));
        assert_eq!(termination.exit_code, 2);
        let parsed: OutputResult = serde_json::from_str(&termination.payload).unwrap();
        assert_eq!(parsed.error_code, FATAL_ERROR_CODE);
        assert_eq!(parsed.error_type, Some(ErrorType::Plugin));
    }
}
