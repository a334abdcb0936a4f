//! Rolling, retention-managed log files.
//!
//! This crate appends log records to a set of files in one directory, rolling
//! to a new file when a time checkpoint passes or a file fills up, and
//! deleting the oldest files beyond the retention limits.
//!
//! ## Usage
//!
//! ```no_run
//! use rolling_log_writer::{Config, RetentionPolicy, RollPolicy, RollingFile, RollingInterval};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roll = RollPolicy::default()
//!     .with_interval(RollingInterval::Day)
//!     .with_size_of_file(100 * 1024 * 1024) // 100 MB per file
//!     .with_roll_on_size(true);
//!
//! let retention = RetentionPolicy::default().with_number_of_files(10);
//!
//! // Files are named app20240315.log, app20240315_001.log, ...
//! let log = RollingFile::new("/var/log/myapp/app.log", Config::new(roll, retention))?;
//!
//! log.emit(b"Hello, rolling file!\n")?;
//! log.flush_to_disk()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Kept file name
//!
//! With [`Config::with_keep_file_name`] the current file is always the base
//! path itself (`app.log` above). When it rolls, it is renamed to the
//! historical name of its checkpoint and sequence, and a fresh file is
//! started at the base path.
//!
//! ## Concurrency
//!
//! A [`RollingFile`] serializes its operations internally and can be shared
//! between threads. Other processes writing the same directory are tolerated:
//! a file locked by another writer makes the engine move on to the next
//! sequence number, up to three attempts.

mod clock;
mod error;
mod hooks;
mod log;
mod make_writer;
pub mod sink;

pub use clock::{Clock, SystemClock};
pub use error::{Result, WriterError};
pub use hooks::FileLifecycleHooks;
pub use log::{Config, RetentionPolicy, RollPolicy, RollingFile};
pub use make_writer::RecordWriter;
pub use sink::{FileWriterFactory, LogWriter, WriterFactory, WriterOptions, is_lock_contention};

pub use log_roller::{Checkpoint, FileMatch, PathRoller, RollingInterval};
