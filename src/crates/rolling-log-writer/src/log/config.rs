use crate::error::{Result, WriterError};
use crate::hooks::FileLifecycleHooks;
use crate::sink::WriterOptions;
use log_roller::RollingInterval;
use std::sync::Arc;
use std::time::Duration;

/// Controls when the current file rolls over to a new one.
///
/// A file rolls when the interval's checkpoint changes and, if `roll_on_size`
/// is set, when a record would push it past `size_of_file`.
#[derive(Debug, Copy, Clone, Default)]
pub struct RollPolicy {
    /// Time granularity of file names
    pub interval: RollingInterval,
    /// Maximum file size in bytes
    pub size_of_file: Option<u64>,
    /// Roll to the next sequence instead of dropping records when a file is full
    pub roll_on_size: bool,
}

impl RollPolicy {
    /// Specifies the rolling interval.
    pub fn with_interval(mut self, interval: RollingInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Specifies the maximum file size.
    pub fn with_size_of_file(mut self, size_of_file: u64) -> Self {
        self.size_of_file = Some(size_of_file);
        self
    }

    /// Specifies whether a full file rolls over or drops records.
    pub fn with_roll_on_size(mut self, roll_on_size: bool) -> Self {
        self.roll_on_size = roll_on_size;
        self
    }
}

/// Controls when old log files are deleted.
///
/// If all fields are `None`, files are never deleted.
#[derive(Debug, Copy, Clone, Default)]
pub struct RetentionPolicy {
    /// Maximum number of files to keep, the current one included
    pub number_of_files: Option<usize>,
    /// Maximum age of a file's checkpoint
    pub age_of_files: Option<Duration>,
}

impl RetentionPolicy {
    /// Specifies maximum number of files.
    pub fn with_number_of_files(mut self, number_of_files: usize) -> Self {
        self.number_of_files = Some(number_of_files);
        self
    }

    /// Specifies maximum age of files.
    pub fn with_age_of_files(mut self, age_of_files: Duration) -> Self {
        self.age_of_files = Some(age_of_files);
        self
    }

    pub(crate) fn is_unbounded(&self) -> bool {
        self.number_of_files.is_none() && self.age_of_files.is_none()
    }
}

/// Configuration for a rolling log file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Policy for when to roll the current file
    pub roll_policy: RollPolicy,
    /// Policy for when to remove old files
    pub retention_policy: RetentionPolicy,
    /// Buffer writes until flushed
    pub buffered: bool,
    /// Share the current file with other processes
    pub shared: bool,
    /// Always write to the base path and rename it away when rolling
    pub keep_file_name: bool,
    pub hooks: Option<Arc<dyn FileLifecycleHooks>>,
}

impl Config {
    /// Creates a new log configuration.
    pub fn new(roll_policy: RollPolicy, retention_policy: RetentionPolicy) -> Self {
        Self {
            roll_policy,
            retention_policy,
            ..Default::default()
        }
    }

    /// Specifies the roll policy
    pub fn with_roll_policy(mut self, policy: RollPolicy) -> Self {
        self.roll_policy = policy;
        self
    }

    /// Specifies the retention policy
    pub fn with_retention_policy(mut self, policy: RetentionPolicy) -> Self {
        self.retention_policy = policy;
        self
    }

    pub fn with_buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Keeps the current file at the unmodified base path.
    pub fn with_keep_file_name(mut self, keep_file_name: bool) -> Self {
        self.keep_file_name = keep_file_name;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FileLifecycleHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Rejects combinations that cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(WriterError::InvalidConfiguration(msg.to_string()));

        if self.retention_policy.number_of_files == Some(0) {
            return invalid("number of retained files must be at least 1");
        }

        if self.retention_policy.age_of_files == Some(Duration::ZERO) {
            return invalid("age of retained files must be positive");
        }

        if self.roll_policy.roll_on_size && self.roll_policy.size_of_file.is_none() {
            return invalid("rolling on size requires a file size limit");
        }

        if self.buffered && self.shared {
            return invalid("buffered writes are not available when the file is shared");
        }

        Ok(())
    }

    /// The file size limit, when reaching it rolls to a new file.
    pub(crate) fn roll_size(&self) -> Option<u64> {
        self.roll_policy
            .size_of_file
            .filter(|_| self.roll_policy.roll_on_size)
    }

    pub(crate) fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            size_limit: self.roll_policy.size_of_file,
            buffered: self.buffered,
            shared: self.shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_retention() {
        let config = Config::default()
            .with_retention_policy(RetentionPolicy::default().with_number_of_files(0));
        assert!(matches!(
            config.validate(),
            Err(WriterError::InvalidConfiguration(_))
        ));

        let config = Config::default()
            .with_retention_policy(RetentionPolicy::default().with_age_of_files(Duration::ZERO));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_roll_on_size_without_limit() {
        let config =
            Config::default().with_roll_policy(RollPolicy::default().with_roll_on_size(true));
        assert!(config.validate().is_err());

        let config = Config::default().with_roll_policy(
            RollPolicy::default()
                .with_roll_on_size(true)
                .with_size_of_file(0),
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.roll_size(), Some(0));
    }

    #[test]
    fn test_rejects_buffered_shared() {
        let config = Config::default().with_buffered(true).with_shared(true);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_size_limit_without_rolling() {
        let config =
            Config::default().with_roll_policy(RollPolicy::default().with_size_of_file(1024));
        assert_eq!(config.roll_size(), None);
        assert_eq!(config.writer_options().size_limit, Some(1024));
    }
}
