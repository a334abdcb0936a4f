use std::fmt;
use std::io;
use std::path::Path;

/// Callbacks invoked around the life of each log file.
pub trait FileLifecycleHooks: Send + Sync + fmt::Debug {
    /// Called after a file has been opened for writing.
    fn on_file_opened(&self, _path: &Path) {}

    /// Called before retention deletes an obsolete file.
    ///
    /// Returning an error keeps the file in place; the failure is logged like
    /// any other deletion failure.
    fn on_file_deleting(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
