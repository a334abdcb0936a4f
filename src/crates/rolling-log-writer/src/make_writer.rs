//! Use a [`RollingFile`] as the output of a `tracing-subscriber` fmt layer.
//!
//! Every formatted event becomes one record. While an event is written, the
//! rolling file's own diagnostics (opened, rolled and deleted files, lock
//! contention) are discarded: they would otherwise be dispatched back into
//! the same file while its lock is held.

use crate::log::RollingFile;
use std::io;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

/// Writer handed out for a single formatted event.
#[derive(Debug)]
pub struct RecordWriter<'a> {
    rolling_file: &'a RollingFile,
}

impl io::Write for RecordWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A global dispatcher has no re-entrancy guard, so a scoped no-op
        // dispatcher stands in for it on this thread.
        tracing::dispatcher::with_default(&Dispatch::none(), || {
            self.rolling_file.emit(buf)
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RecordWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RecordWriter {
            rolling_file: self,
        }
    }
}
