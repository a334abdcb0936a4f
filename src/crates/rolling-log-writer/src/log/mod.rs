mod config;
pub use config::{Config, RetentionPolicy, RollPolicy};

mod retention;
use retention::apply_retention;

use crate::clock::{Clock, SystemClock};
use crate::sink::{FileWriterFactory, LogWriter, WriterFactory, is_lock_contention, rename_unlocked};
use crate::{Result, WriterError};
use chrono::{NaiveDateTime, TimeDelta};
use log_roller::PathRoller;
use parking_lot::{Mutex, const_mutex};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, span, warn};

/// Attempts made to open (or rename away) a file held by another writer.
const MAX_OPEN_ATTEMPTS: usize = 3;

/// Archive names skipped because they already exist before giving up.
const MAX_NAME_COLLISIONS: usize = 16;

/// How often a file set without time-based rolling is re-aligned.
const RECHECK_INTERVAL_MINUTES: i64 = 30;

/// Serializes rename-then-reopen across all kept-name logs of this process.
static KEEP_FILE_NAME_LOCK: Mutex<()> = const_mutex(());

/// Lists the file names in `dir`; a missing directory has no files.
pub(crate) fn list_file_names(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut file_names = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };

        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }

        if let Ok(name) = entry.file_name().into_string() {
            file_names.push(name);
        }
    }

    Ok(file_names)
}

fn next_sequence(sequence: Option<u32>) -> Result<u32> {
    match sequence {
        None => Ok(1),
        Some(last) => last
            .checked_add(1)
            .ok_or(WriterError::SequenceExhausted { last }),
    }
}

/// Everything that changes when the log rolls.
#[derive(Default)]
struct ActiveFile {
    writer: Option<Box<dyn LogWriter>>,
    next_checkpoint: Option<NaiveDateTime>,
    sequence: Option<u32>,
    disposed: bool,
}

/// A set of append-only log files rolled by time and size.
///
/// Records go to exactly one current file at a time. Before every record the
/// current file is re-aligned with the clock: the first record opens a file,
/// crossing a checkpoint closes it and opens the next one. With
/// [`RollPolicy::roll_on_size`], a full file rolls to the next sequence
/// number of the same checkpoint.
///
/// All operations are serialized by one internal lock, so a `RollingFile`
/// can be shared between threads.
pub struct RollingFile {
    roller: PathRoller,
    config: Config,
    clock: Arc<dyn Clock>,
    factory: Arc<dyn WriterFactory>,
    active: Mutex<ActiveFile>,
}

impl RollingFile {
    /// Creates a rolling log around the file name template `path`.
    ///
    /// No file is opened until the first record is emitted.
    pub fn new(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;
        let roller = PathRoller::new(path, config.roll_policy.interval)?;

        Ok(Self {
            roller,
            config,
            clock: Arc::new(SystemClock),
            factory: Arc::new(FileWriterFactory),
            active: Mutex::new(ActiveFile::default()),
        })
    }

    /// Replaces the clock used to pick checkpoints.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the factory used to open files.
    pub fn with_writer_factory(mut self, factory: impl WriterFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn roller(&self) -> &PathRoller {
        &self.roller
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sequence number of the current file, if one is open.
    pub fn current_sequence(&self) -> Option<u32> {
        let active = self.active.lock();
        active.writer.as_ref().and(active.sequence)
    }

    /// Writes one record.
    ///
    /// If the current file is full and the log rolls on size, the record is
    /// retried on the next sequence until a file accepts it. Otherwise a full
    /// file drops the record.
    pub fn emit(&self, record: &[u8]) -> Result<()> {
        let mut active = self.active.lock();
        if active.disposed {
            return Err(WriterError::Disposed);
        }

        let now = self.clock.now();
        self.align_current_file_to(&mut active, now, false)?;

        loop {
            let writer = active.writer.as_mut().ok_or(WriterError::NoActiveFile)?;
            if writer.emit_or_overflow(record)? {
                return Ok(());
            }

            if self.config.roll_size().is_none() {
                debug!("file size limit reached, dropping record");
                return Ok(());
            }

            self.align_current_file_to(&mut active, now, true)?;
        }
    }

    /// Forces buffered records of the current file to persistent storage.
    pub fn flush_to_disk(&self) -> Result<()> {
        let mut active = self.active.lock();
        if let Some(writer) = active.writer.as_mut() {
            writer.flush_to_disk()?;
        }
        Ok(())
    }

    /// Closes the current file. Later calls to [`Self::emit`] fail.
    pub fn dispose(&self) -> Result<()> {
        let mut active = self.active.lock();
        if active.disposed {
            return Ok(());
        }

        active.disposed = true;
        self.close_file(&mut active)?;
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.active.lock().disposed
    }

    fn align_current_file_to(
        &self,
        active: &mut ActiveFile,
        now: NaiveDateTime,
        force_next_sequence: bool,
    ) -> Result<()> {
        let Some(next_checkpoint) = active.next_checkpoint else {
            return self.open_file(active, now, None);
        };

        if !force_next_sequence && now < next_checkpoint {
            return Ok(());
        }

        let min_sequence = force_next_sequence
            .then(|| next_sequence(active.sequence))
            .transpose()?;

        if let Err(e) = self.close_file(active) {
            warn!("failed to close log file while rolling: {}", e);
        }

        self.open_file(active, now, min_sequence)
    }

    fn close_file(&self, active: &mut ActiveFile) -> io::Result<()> {
        active.next_checkpoint = None;

        match active.writer.take() {
            Some(mut writer) => writer.close(),
            None => Ok(()),
        }
    }

    #[instrument(skip_all, fields(min_sequence, active_file))]
    fn open_file(
        &self,
        active: &mut ActiveFile,
        now: NaiveDateTime,
        min_sequence: Option<u32>,
    ) -> Result<()> {
        if let Some(min_sequence) = min_sequence {
            tracing::Span::current().record("min_sequence", min_sequence);
        }

        let next_checkpoint = self
            .roller
            .next_checkpoint(now)
            .or_else(|| now.checked_add_signed(TimeDelta::minutes(RECHECK_INTERVAL_MINUTES)));
        active.next_checkpoint = next_checkpoint;

        let result = self.open_file_at(now, min_sequence);

        match result {
            Ok((writer, path, sequence)) => {
                tracing::Span::current()
                    .record("active_file", tracing::field::display(path.display()));
                debug!("opened {} (sequence {:?})", path.display(), sequence);

                if let Some(hooks) = self.config.hooks.as_deref() {
                    hooks.on_file_opened(&path);
                }

                active.writer = Some(writer);
                active.sequence = sequence;
                Ok(())
            }
            Err(e) => {
                // start over on the next record
                active.writer = None;
                active.next_checkpoint = None;
                active.sequence = None;
                Err(e)
            }
        }
    }

    /// Picks the sequence to start from and opens the current file.
    fn open_file_at(
        &self,
        now: NaiveDateTime,
        min_sequence: Option<u32>,
    ) -> Result<(Box<dyn LogWriter>, PathBuf, Option<u32>)> {
        let checkpoint = self.roller.current_checkpoint(now);
        let existing = list_file_names(self.roller.directory())?;

        let latest = self
            .roller
            .select_matches(&existing)
            .filter(|m| m.checkpoint == checkpoint)
            .max_by_key(|m| m.sequence);

        let mut sequence = if self.config.keep_file_name {
            // The bare name is occupied by the current file itself, so the
            // first historical name of a checkpoint starts at 1.
            latest.map(|m| next_sequence(m.sequence)).transpose()?
        } else {
            latest.and_then(|m| m.sequence)
        };

        if let Some(min_sequence) = min_sequence {
            if sequence.is_none_or(|sequence| sequence < min_sequence) {
                sequence = Some(min_sequence);
            }
        }

        if self.config.keep_file_name {
            self.open_kept_file_name(now, sequence, min_sequence.is_some())
        } else {
            self.open_sequenced_file(now, sequence)
        }
    }

    fn open_sequenced_file(
        &self,
        now: NaiveDateTime,
        mut sequence: Option<u32>,
    ) -> Result<(Box<dyn LogWriter>, PathBuf, Option<u32>)> {
        let options = self.config.writer_options();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let path = self.roller.file_path(now, sequence);

            match self.factory.open(&path, &options) {
                Ok(writer) => {
                    self.apply_retention(&path, now);
                    return Ok((writer, path, sequence));
                }
                Err(e) if is_lock_contention(&e) => {
                    warn!(
                        "{} is locked (attempt {}/{}): {}",
                        path.display(),
                        attempts,
                        MAX_OPEN_ATTEMPTS,
                        e
                    );
                    if attempts >= MAX_OPEN_ATTEMPTS {
                        return Err(WriterError::RetriesExhausted { path, attempts });
                    }
                    sequence = Some(next_sequence(sequence)?);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Opens the base path, first renaming a previous file away if it must
    /// be preserved.
    fn open_kept_file_name(
        &self,
        now: NaiveDateTime,
        mut sequence: Option<u32>,
        forced: bool,
    ) -> Result<(Box<dyn LogWriter>, PathBuf, Option<u32>)> {
        let _guard = KEEP_FILE_NAME_LOCK.lock();
        let current_path = self.roller.base_path();

        if self.must_archive(current_path, forced)? {
            let mut attempts = 0;
            let mut collisions = 0;
            let archived_path = loop {
                let target = self.roller.file_path(now, sequence);

                if target == current_path || target.exists() {
                    error!(
                        "{} already exists (sequence {:?}), not overwriting it with {}",
                        target.display(),
                        sequence,
                        current_path.display()
                    );
                    collisions += 1;
                    if collisions >= MAX_NAME_COLLISIONS {
                        return Err(WriterError::NameCollisions {
                            path: target,
                            collisions,
                        });
                    }
                    sequence = Some(next_sequence(sequence)?);
                    continue;
                }

                attempts += 1;
                match rename_unlocked(current_path, &target) {
                    Ok(()) => {
                        info!("rolled {} to {}", current_path.display(), target.display());
                        break target;
                    }
                    Err(e) if is_lock_contention(&e) => {
                        warn!(
                            "{} is locked (attempt {}/{}): {}",
                            current_path.display(),
                            attempts,
                            MAX_OPEN_ATTEMPTS,
                            e
                        );
                        if attempts >= MAX_OPEN_ATTEMPTS {
                            return Err(WriterError::RetriesExhausted {
                                path: current_path.to_path_buf(),
                                attempts,
                            });
                        }
                        sequence = Some(next_sequence(sequence)?);
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            self.apply_retention(&archived_path, now);
        }

        let writer = self
            .factory
            .open(current_path, &self.config.writer_options())?;
        Ok((writer, current_path.to_path_buf(), sequence))
    }

    /// Whether the file at the base path holds records that must be kept
    /// under a historical name before the base path is reused.
    fn must_archive(&self, path: &Path, forced: bool) -> Result<bool> {
        let size = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let archive = match self.config.roll_size() {
            // a forced roll means the writer refused a record
            Some(limit) => size >= limit || (forced && size > 0),
            None => size > 0,
        };

        Ok(archive)
    }

    fn apply_retention(&self, current_path: &Path, now: NaiveDateTime) {
        apply_retention(
            &self.roller,
            &self.config.retention_policy,
            current_path,
            self.config.keep_file_name,
            now,
            self.config.hooks.as_deref(),
        );
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            error!("failed to close log file: {}", e);
        }
    }
}

impl std::fmt::Debug for RollingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingFile")
            .field("roller", &self.roller)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
