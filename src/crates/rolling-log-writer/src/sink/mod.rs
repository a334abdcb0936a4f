//! Writers that append records to a single open log file.
//!
//! The rolling engine only talks to a [`LogWriter`] through its narrow
//! append/flush/close contract and obtains writers from a [`WriterFactory`].
//! [`FileWriterFactory`] picks between an exclusive, optionally buffered
//! writer and a writer that shares the file with other processes.

mod exclusive;
mod shared;

pub use exclusive::ExclusiveFileWriter;
pub use shared::SharedFileWriter;

use std::fs::{File, OpenOptions, TryLockError};
use std::io;
use std::path::Path;

/// Appends records to one open file.
pub trait LogWriter: Send {
    /// Appends `record`, or returns `false` without writing it when the file
    /// has reached its size limit.
    fn emit_or_overflow(&mut self, record: &[u8]) -> io::Result<bool>;

    /// Forces buffered bytes to persistent storage.
    fn flush_to_disk(&mut self) -> io::Result<()>;

    /// Releases the file. Calling it more than once is a no-op.
    fn close(&mut self) -> io::Result<()>;
}

/// Options handed to a [`WriterFactory`] for every file it opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Size in bytes past which the writer reports overflow
    pub size_limit: Option<u64>,
    /// Buffer writes in memory until flushed
    pub buffered: bool,
    /// Allow other processes to append to the same file
    pub shared: bool,
}

/// Opens writers for the rolling engine.
pub trait WriterFactory: Send + Sync {
    /// Opens (creating if needed) the file at `path` for appending.
    ///
    /// A file held by another writer must be reported as an error for which
    /// [`is_lock_contention`] returns `true`.
    fn open(&self, path: &Path, options: &WriterOptions) -> io::Result<Box<dyn LogWriter>>;
}

/// Opens real files, guarded by advisory locks.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileWriterFactory;

impl WriterFactory for FileWriterFactory {
    fn open(&self, path: &Path, options: &WriterOptions) -> io::Result<Box<dyn LogWriter>> {
        if options.shared {
            Ok(Box::new(SharedFileWriter::open(path, options)?))
        } else {
            Ok(Box::new(ExclusiveFileWriter::open(path, options)?))
        }
    }
}

/// Whether `err` means another handle transiently holds the file.
pub fn is_lock_contention(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Whether a record of `len` bytes must be refused by a file of `written` bytes.
///
/// An empty file accepts any record so that oversized records still land
/// somewhere.
pub(crate) fn exceeds_limit(size_limit: Option<u64>, written: u64, len: usize) -> bool {
    size_limit.is_some_and(|limit| written > 0 && written.saturating_add(len as u64) > limit)
}

pub(crate) fn open_for_append(path: &Path, shared: bool) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    try_lock(&file, shared)?;
    Ok(file)
}

fn try_lock(file: &File, shared: bool) -> io::Result<()> {
    let result = if shared {
        file.try_lock_shared()
    } else {
        file.try_lock()
    };

    result.map_err(|e| match e {
        TryLockError::WouldBlock => io::Error::new(
            io::ErrorKind::WouldBlock,
            "file is locked by another writer",
        ),
        TryLockError::Error(e) => e,
    })
}

/// Renames `from` to `to` unless another handle holds a lock on `from`.
pub(crate) fn rename_unlocked(from: &Path, to: &Path) -> io::Result<()> {
    {
        let file = OpenOptions::new().read(true).open(from)?;
        try_lock(&file, false)?;
    }

    std::fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exceeds_limit() {
        assert!(!exceeds_limit(None, 10_000, 10_000));
        assert!(!exceeds_limit(Some(1000), 0, 5000));
        assert!(!exceeds_limit(Some(1000), 800, 200));
        assert!(exceeds_limit(Some(1000), 800, 201));
        assert!(exceeds_limit(Some(0), 1, 0));
    }

    #[test]
    fn test_lock_contention_classification() {
        assert!(is_lock_contention(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_lock_contention(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_lock_contention(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
    }

    #[test]
    fn test_open_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/app.log");

        let writer = FileWriterFactory.open(&path, &WriterOptions::default());
        assert!(writer.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_exclusive_writers_contend() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let options = WriterOptions::default();

        let _first = FileWriterFactory.open(&path, &options).unwrap();
        let err = FileWriterFactory.open(&path, &options).err().unwrap();
        assert!(is_lock_contention(&err));

        let shared = WriterOptions {
            shared: true,
            ..options
        };
        let err = FileWriterFactory.open(&path, &shared).err().unwrap();
        assert!(is_lock_contention(&err));
    }

    #[test]
    fn test_shared_writers_coexist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let options = WriterOptions {
            shared: true,
            ..Default::default()
        };

        let mut first = FileWriterFactory.open(&path, &options).unwrap();
        let mut second = FileWriterFactory.open(&path, &options).unwrap();

        assert!(first.emit_or_overflow(b"one\n").unwrap());
        assert!(second.emit_or_overflow(b"two\n").unwrap());
        first.close().unwrap();
        second.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_rename_refuses_locked_source() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("app.log");
        let to = dir.path().join("app_001.log");

        let mut writer = FileWriterFactory
            .open(&from, &WriterOptions::default())
            .unwrap();
        let err = rename_unlocked(&from, &to).unwrap_err();
        assert!(is_lock_contention(&err));

        writer.close().unwrap();
        rename_unlocked(&from, &to).unwrap();
        assert!(!from.exists());
        assert!(to.exists());
    }
}
