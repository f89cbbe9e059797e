use std::time::Duration;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mpstream::process::session::SessionStats;

pub fn create_spinner(multi: &MultiProgress, label: &str) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} {bytes} received ({binary_bytes_per_sec})\n{msg} | elapsed: {elapsed_precise}",
    )?);

    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("reading {label}"));
    Ok(pb)
}

pub fn update_spinner(pb: &ProgressBar, stats: &SessionStats) {
    pb.set_position(stats.bytes_received);
    pb.set_message(format!(
        "{} frames, {} tags, {} OOB bytes",
        stats.sync.frames, stats.sync.tags, stats.sync.oob_bytes
    ));
}
