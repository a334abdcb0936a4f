use rolling_log_writer::{RollingFile, WriterError};
use std::io::BufRead;

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

/// Counters reported once the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TeeStats {
    pub lines: u64,
    pub bytes: u64,
    /// Lines lost because every candidate file was locked
    pub dropped: u64,
}

/// Emits every line of `reader` as one record, newline included.
///
/// The log is flushed to disk every `flush_every` lines and at end of input.
/// A line that finds every candidate file locked is dropped with a warning;
/// any other error stops the copy.
pub fn copy_lines<R: BufRead>(
    mut reader: R,
    log: &RollingFile,
    flush_every: Option<usize>,
) -> anyhow::Result<TeeStats> {
    let mut stats = TeeStats::default();
    let mut line = Vec::new();
    let mut unflushed = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        match log.emit(&line) {
            Ok(()) => {
                stats.lines += 1;
                stats.bytes += line.len() as u64;
            }
            Err(e @ WriterError::RetriesExhausted { .. }) => {
                warn!("dropping line: {}", e);
                stats.dropped += 1;
            }
            Err(e) => return Err(e.into()),
        }

        unflushed += 1;
        if flush_every.is_some_and(|n| unflushed >= n) {
            log.flush_to_disk()?;
            unflushed = 0;
        }
    }

    log.flush_to_disk()?;
    debug!(?stats, "end of input");
    Ok(stats)
}
