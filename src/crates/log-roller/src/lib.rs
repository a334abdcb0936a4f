//! Naming scheme for rolling log files.
//!
//! A [`PathRoller`] turns a base path such as `/var/log/app/app.log` and a
//! [`RollingInterval`] into concrete file names:
//!
//! ```text
//! app.log             current file in stable-name mode, or Infinite interval
//! app_001.log         Infinite interval, sequence 1
//! app20240315.log     Day interval, first file of the day
//! app20240315_002.log Day interval, sequence 2
//! ```
//!
//! and parses directory listings back into [`FileMatch`]es. Nothing in this
//! crate touches the file system.
//!
//! ## Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use log_roller::{PathRoller, RollingInterval};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roller = PathRoller::new("logs/app.log", RollingInterval::Day)?;
//! let now = NaiveDate::from_ymd_opt(2024, 3, 15)
//!     .unwrap()
//!     .and_hms_opt(10, 30, 0)
//!     .unwrap();
//!
//! let path = roller.file_path(now, Some(2));
//! assert_eq!(path, std::path::Path::new("logs/app20240315_002.log"));
//!
//! let matched = roller.parse("app20240315_002.log").unwrap();
//! assert_eq!(matched.checkpoint, roller.current_checkpoint(now));
//! assert_eq!(matched.sequence, Some(2));
//! # Ok(())
//! # }
//! ```

mod error;
mod file_match;
mod interval;
mod roller;

pub use error::{Result, RollerError};
pub use file_match::FileMatch;
pub use interval::{Checkpoint, RollingInterval};
pub use roller::PathRoller;
