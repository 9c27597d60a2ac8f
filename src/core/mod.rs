//! Core runtime of an atom.
//!
//! This module holds the data the atom runs against (paths, identity,
//! parameters), the result accumulator, and the lifecycle that turns the
//! result into an output file and an exit code.

mod context;
mod lifecycle;
mod output;
mod params;
mod paths;
mod runtime;

pub use context::{AtomContext, BootstrapOptions};
pub use lifecycle::{execute, exit_code, run, Termination, Verdict, FATAL_ERROR_CODE};
pub use output::{
    ArtifactData, ArtifactRepo, DataType, ErrorType, FileChecksums, FileDetail, OutputResult,
    QualityDatum, ReportData, ReportType, Status, StringData, OUTPUT_TYPE_DEFAULT,
    OUTPUT_TYPE_QUALITY,
};
pub use params::{BaseParameters, ParameterSet, NO_POST_ACTION};
pub use paths::{
    RuntimePaths, DATA_DIR_ENV, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE, INPUT_FILE_ENV,
    OUTPUT_FILE_ENV, SECRETS_FILE,
};
pub use runtime::{BuildType, RuntimeEnvironment};
