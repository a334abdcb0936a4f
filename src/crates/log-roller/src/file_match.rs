use crate::interval::Checkpoint;
use std::cmp::Ordering;

/// A directory entry whose name follows the roller's naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileMatch {
    /// File name, without the directory
    pub file_name: String,
    /// Checkpoint embedded in the name, if rolling is time based
    pub checkpoint: Option<Checkpoint>,
    /// Sequence suffix; `None` for the first, unsuffixed file of a checkpoint
    pub sequence: Option<u32>,
}

impl Ord for FileMatch {
    /// Oldest first: by checkpoint, then sequence, then name for stability.
    ///
    /// A missing checkpoint or sequence sorts before any present one.
    fn cmp(&self, other: &Self) -> Ordering {
        self.checkpoint
            .cmp(&other.checkpoint)
            .then_with(|| self.sequence.cmp(&other.sequence))
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

impl PartialOrd for FileMatch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
