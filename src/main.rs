//! `atom-echo`: a reference atom.
//!
//! Echoes its `message` input back as output data, optionally reports a
//! quality value and looks up a build context variable. Used to exercise the
//! runtime end to end.

use anyhow::{Context, Result};
use serde::Deserialize;

use atom_sdk::core::NO_POST_ACTION;
use atom_sdk::{log, AtomContext, ErrorType, QualityDatum, StringData, Verdict};

/// Error code for input the pipeline user has to fix.
const INVALID_INPUT_CODE: i64 = 2189001;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EchoInput {
    message: String,
    /// `"true"` makes the atom report a failure after echoing
    fail: String,
    quality: Option<String>,
    /// Build context variable to copy into the output
    variable: Option<String>,
}

fn main() {
    atom_sdk::run(|ctx| {
        echo(ctx).unwrap_or_else(|e| {
            tracing::error!("{:#}", e);
            Verdict::error(e.to_string()).with_error(atom_sdk::core::FATAL_ERROR_CODE, ErrorType::Plugin)
        })
    })
}

fn echo(ctx: &mut AtomContext) -> Result<Verdict> {
    let post_action = ctx.base().post_action_param.clone();
    if post_action != NO_POST_ACTION {
        tracing::info!("running post action {}", post_action);
        return Ok(Verdict::success(format!("post action {post_action} done")));
    }

    let input: EchoInput = ctx.load_input().context("invalid echo input")?;
    if input.message.is_empty() {
        return Ok(Verdict::failure("message is required")
            .with_error(INVALID_INPUT_CODE, ErrorType::User));
    }

    log::group("Echo");
    tracing::info!("pipeline {} build #{}", ctx.base().pipeline_id, ctx.base().build_num);
    ctx.output_mut()
        .add_data("echo", StringData::new(input.message.as_str()))
        .context("record echo output")?;

    if let Some(quality) = input.quality {
        ctx.output_mut().add_quality_data("echo_quality", QualityDatum::new(quality));
    }

    if let Some(name) = input.variable.filter(|n| !n.is_empty()) {
        let value = ctx.api().variable_by_name(&name);
        tracing::info!("{} = {}", name, value);
        ctx.output_mut()
            .add_data("variable", StringData::new(value))
            .context("record variable output")?;
    }
    log::end_group();

    if input.fail == "true" {
        return Ok(Verdict::failure(format!("asked to fail after echoing {}", input.message)));
    }
    Ok(Verdict::success("success"))
}
