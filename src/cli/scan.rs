use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, ScanArgs};
use super::output::sanitize_label;
use super::session::run_session;
use crate::input::InputReader;

pub fn cmd_scan(args: &ScanArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Scanning {}", args.input.display());

    let mut input = InputReader::new(&args.input)?;
    let label = sanitize_label(input.label());
    let source_name = args.input.display().to_string();

    run_session(&mut input, &source_name, &label, &args.sinks, cli, multi)?;

    Ok(())
}
