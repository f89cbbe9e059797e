use anyhow::{Context, Result};
use indicatif::MultiProgress;

use mpstream::source::resolve;

use super::command::{Cli, StreamArgs};
use super::output::sanitize_label;
use super::session::run_session;

pub fn cmd_stream(args: &StreamArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Resolving {}", args.url);
    let mut resolved =
        resolve(&args.url).with_context(|| format!("Stream unavailable: {}", args.url))?;

    log::info!(
        "Streaming {}{} via {}",
        resolved.target,
        resolved.target.path,
        resolved.origin
    );

    let label = sanitize_label(&resolved.origin.host);
    let source_name = resolved.target.to_string();
    run_session(
        &mut resolved.stream,
        &source_name,
        &label,
        &args.sinks,
        cli,
        multi,
    )?;

    Ok(())
}
