use crate::error::{Result, RollerError};
use crate::file_match::FileMatch;
use crate::interval::{Checkpoint, RollingInterval};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

const SEQUENCE_SEPARATOR: char = '_';
const SEQUENCE_WIDTH: usize = 3;

/// Maps `(time, sequence)` to file paths and file names back to
/// `(checkpoint, sequence)`.
///
/// File names are `{prefix}{checkpoint}{_sequence}{extension}` where the
/// prefix and extension come from the base path, the checkpoint token depends
/// on the rolling interval and the sequence is zero-padded to three digits.
#[derive(Debug, Clone)]
pub struct PathRoller {
    base_path: PathBuf,
    directory: PathBuf,
    prefix: String,
    extension: String,
    interval: RollingInterval,
}

impl PathRoller {
    /// Creates a roller for files living next to `path`.
    pub fn new(path: impl AsRef<Path>, interval: RollingInterval) -> Result<Self> {
        let path = path.as_ref();

        let invalid = |reason| RollerError::InvalidPath {
            path: path.to_path_buf(),
            reason,
        };

        if path.as_os_str().is_empty() {
            return Err(invalid("path is empty"));
        }

        let file_name = path
            .file_name()
            .ok_or_else(|| invalid("path has no file name"))?
            .to_str()
            .ok_or_else(|| invalid("file name contains invalid UTF-8"))?;

        let (prefix, extension) = match file_name.rfind('.') {
            Some(pos) if pos > 0 => (&file_name[..pos], &file_name[pos..]),
            _ => (file_name, ""),
        };

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            base_path: directory.join(file_name),
            directory,
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            interval,
        })
    }

    /// Directory holding the current and historical files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The unmodified base path, used as the current file in stable-name mode
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn interval(&self) -> RollingInterval {
        self.interval
    }

    /// Glob pattern matching every file this roller could have produced.
    pub fn search_pattern(&self) -> String {
        format!("{}*{}", self.prefix, self.extension)
    }

    pub fn current_checkpoint(&self, now: NaiveDateTime) -> Option<Checkpoint> {
        self.interval.checkpoint(now)
    }

    pub fn next_checkpoint(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.interval.next_checkpoint(now)
    }

    /// File name for a checkpoint and an optional sequence number.
    pub fn file_name(&self, checkpoint: Option<Checkpoint>, sequence: Option<u32>) -> String {
        let token = self.interval.format_token(checkpoint);

        match sequence {
            Some(sequence) => format!(
                "{}{}{}{:0width$}{}",
                self.prefix,
                token,
                SEQUENCE_SEPARATOR,
                sequence,
                self.extension,
                width = SEQUENCE_WIDTH
            ),
            None => format!("{}{}{}", self.prefix, token, self.extension),
        }
    }

    /// Full path of the file holding records written at `now` with the given
    /// sequence number.
    pub fn file_path(&self, now: NaiveDateTime, sequence: Option<u32>) -> PathBuf {
        self.directory
            .join(self.file_name(self.current_checkpoint(now), sequence))
    }

    /// Parses a file name produced by [`Self::file_name`].
    ///
    /// Returns `None` for anything that does not follow the naming scheme,
    /// including non-canonical sequence suffixes like `_0001`.
    pub fn parse(&self, file_name: &str) -> Option<FileMatch> {
        let middle = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?;

        let (token, rest) = middle.split_at_checked(self.interval.token_len())?;

        let checkpoint = match self.interval {
            RollingInterval::Infinite => None,
            interval => Some(interval.parse_token(token)?),
        };

        let sequence = if rest.is_empty() {
            None
        } else {
            Some(parse_sequence(rest.strip_prefix(SEQUENCE_SEPARATOR)?)?)
        };

        Some(FileMatch {
            file_name: file_name.to_string(),
            checkpoint,
            sequence,
        })
    }

    /// Lazily keeps the names that follow the naming scheme, in input order.
    pub fn select_matches<I, S>(&self, file_names: I) -> impl Iterator<Item = FileMatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        file_names
            .into_iter()
            .filter_map(move |name| self.parse(name.as_ref()))
    }
}

fn parse_sequence(digits: &str) -> Option<u32> {
    if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    if digits.len() > SEQUENCE_WIDTH && digits.starts_with('0') {
        return None;
    }

    digits.parse().ok()
}
