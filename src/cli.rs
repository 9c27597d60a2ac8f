//! Command-line flags the CI worker passes to every atom.

use clap::Parser;

use crate::core::NO_POST_ACTION;

/// Flags understood by the runtime. Anything else on the command line is
/// left to the plugin.
#[derive(Debug, Clone, Parser)]
#[command(ignore_errors = true, disable_help_flag = true, disable_version_flag = true)]
pub struct AtomArgs {
    /// Post action entry point to run instead of the main body
    #[arg(long = "postAction", default_value = NO_POST_ACTION)]
    pub post_action: String,

    /// Arguments meant for the plugin itself
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub rest: Vec<String>,
}
