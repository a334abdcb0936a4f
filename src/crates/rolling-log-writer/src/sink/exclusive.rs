use super::{LogWriter, WriterOptions, exceeds_limit, open_for_append};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Single-process writer holding an exclusive lock on its file.
///
/// The file size is tracked in memory, starting from the size found at open
/// time.
#[derive(Debug)]
pub struct ExclusiveFileWriter {
    path: PathBuf,
    output: Option<BufWriter<File>>,
    buffered: bool,
    size_limit: Option<u64>,
    written: u64,
}

impl ExclusiveFileWriter {
    pub fn open(path: &Path, options: &WriterOptions) -> io::Result<Self> {
        let file = open_for_append(path, false)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            output: Some(BufWriter::new(file)),
            buffered: options.buffered,
            size_limit: options.size_limit,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the file, including bytes still buffered
    pub fn len(&self) -> u64 {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
}

impl LogWriter for ExclusiveFileWriter {
    fn emit_or_overflow(&mut self, record: &[u8]) -> io::Result<bool> {
        let Some(output) = self.output.as_mut() else {
            return Err(closed(&self.path));
        };

        if exceeds_limit(self.size_limit, self.written, record.len()) {
            return Ok(false);
        }

        output.write_all(record)?;
        self.written += record.len() as u64;

        if !self.buffered {
            output.flush()?;
        }

        Ok(true)
    }

    fn flush_to_disk(&mut self) -> io::Result<()> {
        if let Some(output) = self.output.as_mut() {
            output.flush()?;
            output.get_ref().sync_data()?;
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        // dropping the handle releases the lock
        if let Some(mut output) = self.output.take() {
            output.flush()?;
        }
        Ok(())
    }
}

impl Drop for ExclusiveFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!("failed to close {}: {}", self.path.display(), e);
        }
    }
}

pub(super) fn closed(path: &Path) -> io::Error {
    io::Error::other(format!("{} is closed", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overflow_keeps_record_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let options = WriterOptions {
            size_limit: Some(10),
            ..Default::default()
        };

        let mut writer = ExclusiveFileWriter::open(&path, &options).unwrap();
        assert!(writer.emit_or_overflow(b"12345678").unwrap());
        assert!(!writer.emit_or_overflow(b"abc").unwrap());
        assert!(writer.emit_or_overflow(b"ab").unwrap());
        writer.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"12345678ab");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"0123456789").unwrap();

        let options = WriterOptions {
            size_limit: Some(10),
            ..Default::default()
        };
        let mut writer = ExclusiveFileWriter::open(&path, &options).unwrap();
        assert_eq!(writer.len(), 10);
        assert!(!writer.emit_or_overflow(b"x").unwrap());
    }

    #[test]
    fn test_buffered_writes_reach_disk_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let options = WriterOptions {
            buffered: true,
            ..Default::default()
        };

        let mut writer = ExclusiveFileWriter::open(&path, &options).unwrap();
        writer.emit_or_overflow(b"hello\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"");

        writer.flush_to_disk().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        let mut writer = ExclusiveFileWriter::open(&path, &WriterOptions::default()).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        writer.flush_to_disk().unwrap();
        assert!(writer.emit_or_overflow(b"late").is_err());
    }
}
