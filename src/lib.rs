//! # Atom SDK
//!
//! Runtime support for CI pipeline plugins ("atoms").
//!
//! An atom is a single pipeline step the CI worker runs as its own process.
//! This crate covers the contract that process has to honour:
//!
//! - **Inputs**: plugin parameters and base parameters from the input file
//! - **Identity**: the `.sdk.json` descriptor that authenticates callbacks
//! - **Callbacks**: commit history, repository info, credentials, build
//!   variables and build context from the CI gateway
//! - **Result**: the output file and a status-derived exit code, produced once
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use atom_sdk::{StringData, Verdict};
//!
//! fn main() {
//!     atom_sdk::run(|ctx| {
//!         let target = ctx.input_param("target").to_string();
//!         if target.is_empty() {
//!             return Verdict::failure("target is required");
//!         }
//!         if ctx.output_mut().add_data("target", StringData::new(target)).is_err() {
//!             return Verdict::error("cannot record output");
//!         }
//!         Verdict::success("success")
//!     })
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::unreadable_literal)]

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod i18n;
pub mod log;
mod serde_ext;

pub use api::{ApiClient, BuildScope, CommitGroup, CommitRecord, RepositorySelector};
pub use core::{
    execute, run, ArtifactData, AtomContext, BaseParameters, BootstrapOptions, BuildType,
    ErrorType, OutputResult, ParameterSet, QualityDatum, ReportData, RuntimeEnvironment,
    RuntimePaths, Status, StringData, Termination, Verdict,
};
pub use error::{SdkError, SdkResult};
pub use i18n::Catalog;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
