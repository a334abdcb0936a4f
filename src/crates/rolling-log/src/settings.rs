use anyhow::{Context, Result};
use bytesize::ByteSize;
use clap::Parser;
use rolling_log_writer::{Config, RetentionPolicy, RollPolicy, RollingInterval};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parse a duration string for clap (e.g., "7 days", "1 week", "168h")
fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| {
        format!(
            "Invalid duration format: '{}'. Use formats like '7 days', '1 week', '168h'. Error: {}",
            s, e
        )
    })
}

/// Parse a bytesize string for clap (e.g., "100MB", "1.5GB", "512MiB")
fn parse_bytesize(s: &str) -> Result<ByteSize, String> {
    s.parse().map_err(|e| {
        format!(
            "Invalid size format: '{}'. Use formats like '100MB', '1.5GB', '512MiB'. Error: {}",
            s, e
        )
    })
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
#[command(name = "rolling-log")]
#[command(about = "Copy lines from stdin into a set of rolling log files.")]
#[command(version)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Load every other setting from this YAML file
    #[arg(long = "config")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Base path of the log files, e.g. /var/log/app/app.log
    #[arg(long)]
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Time granularity of file names (infinite, year, month, day, hour, minute)
    #[arg(long, default_value = "infinite")]
    #[serde(default)]
    pub interval: RollingInterval,

    /// Maximum size of a single file (accepts human-readable sizes like "100MB", "1.5GB")
    #[arg(long, value_parser = parse_bytesize)]
    #[serde(default)]
    pub size_of_file: Option<ByteSize>,

    /// Start a new file when the current one is full instead of dropping lines
    #[arg(long)]
    #[serde(default)]
    pub roll_on_size: bool,

    /// Maximum number of files to keep, the current one included
    #[arg(long)]
    #[serde(default)]
    pub number_of_files: Option<usize>,

    /// Maximum age of kept files (accepts human-readable durations like "7 days", "1 week", "168h")
    #[arg(long, value_parser = parse_duration)]
    #[serde(default, with = "humantime_serde")]
    pub age_of_files: Option<Duration>,

    /// Buffer writes and only flush them periodically
    #[arg(long)]
    #[serde(default)]
    pub buffered: bool,

    /// Allow other processes to append to the same files
    #[arg(long)]
    #[serde(default)]
    pub shared: bool,

    /// Always write to the base path, renaming it away when rolling
    #[arg(long)]
    #[serde(default)]
    pub keep_file_name: bool,

    /// Flush to disk after this many lines
    #[arg(long)]
    #[serde(default)]
    pub flush_every: Option<usize>,
}

impl Settings {
    /// Parses the command line, switching to the YAML file given by
    /// `--config` if present.
    pub fn new() -> Result<Self> {
        Self::resolve(Self::parse())
    }

    fn resolve(cli: Self) -> Result<Self> {
        let settings = match &cli.config_file {
            Some(path) => Self::from_yaml_file(path)?,
            None => cli,
        };

        if settings.flush_every == Some(0) {
            anyhow::bail!("flush interval must be at least one line");
        }

        Ok(settings)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config file: {}", path.display()))?;
        Ok(settings)
    }

    /// The base path together with the rolling file configuration.
    pub fn rolling_config(&self) -> Result<(PathBuf, Config)> {
        let path = self
            .path
            .clone()
            .context("no log file path given, use --path or set `path` in the config file")?;

        let mut roll_policy = RollPolicy::default()
            .with_interval(self.interval)
            .with_roll_on_size(self.roll_on_size);
        if let Some(size) = self.size_of_file {
            roll_policy = roll_policy.with_size_of_file(size.as_u64());
        }

        let mut retention_policy = RetentionPolicy::default();
        if let Some(number_of_files) = self.number_of_files {
            retention_policy = retention_policy.with_number_of_files(number_of_files);
        }
        if let Some(age_of_files) = self.age_of_files {
            retention_policy = retention_policy.with_age_of_files(age_of_files);
        }

        let config = Config::new(roll_policy, retention_policy)
            .with_buffered(self.buffered)
            .with_shared(self.shared)
            .with_keep_file_name(self.keep_file_name);
        config.validate()?;

        Ok((path, config))
    }
}
