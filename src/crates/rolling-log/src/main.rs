mod settings;
mod tee;
mod tracing_setup;

use anyhow::{Context, Result};
use rolling_log_writer::RollingFile;
use settings::Settings;

fn main() -> Result<()> {
    tracing_setup::init_tracing("info");

    let settings = Settings::new()?;
    let (path, config) = settings.rolling_config()?;

    let log = RollingFile::new(&path, config)
        .with_context(|| format!("failed to set up rolling log at {}", path.display()))?;

    tracing::info!(
        "writing to {} (interval {}, files {})",
        log.roller().directory().display(),
        log.roller().interval(),
        log.roller().search_pattern(),
    );

    let stats = tee::copy_lines(std::io::stdin().lock(), &log, settings.flush_every)?;
    log.dispose().context("failed to close the current log file")?;

    tracing::info!(
        lines = stats.lines,
        bytes = stats.bytes,
        dropped = stats.dropped,
        "input exhausted"
    );

    Ok(())
}
