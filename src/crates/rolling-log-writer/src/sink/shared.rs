use super::exclusive::closed;
use super::{LogWriter, WriterOptions, exceeds_limit, open_for_append};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writer that lets several processes append to the same file.
///
/// Writes are never buffered, and the size limit is checked against the
/// file's current length so that appends from other processes count.
#[derive(Debug)]
pub struct SharedFileWriter {
    path: PathBuf,
    file: Option<File>,
    size_limit: Option<u64>,
}

impl SharedFileWriter {
    pub fn open(path: &Path, options: &WriterOptions) -> io::Result<Self> {
        let file = open_for_append(path, true)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            size_limit: options.size_limit,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogWriter for SharedFileWriter {
    fn emit_or_overflow(&mut self, record: &[u8]) -> io::Result<bool> {
        let Some(file) = self.file.as_mut() else {
            return Err(closed(&self.path));
        };

        if self.size_limit.is_some() {
            let written = file.metadata()?.len();
            if exceeds_limit(self.size_limit, written, record.len()) {
                return Ok(false);
            }
        }

        // O_APPEND: every write lands at the current end of file
        file.write_all(record)?;
        Ok(true)
    }

    fn flush_to_disk(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_ref() {
            file.sync_data()?;
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take();
        Ok(())
    }
}
