//! Periodic re-import of the newest file in a directory.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use super::{import_file, newest_json_in, ImportSource, ImportSummary};
use crate::error::Result;
use crate::storage::Database;

/// Signal sent to a running [`AutoImport::watch`] loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Import immediately instead of waiting for the next tick.
    RunNow,
    /// Leave the loop.
    Stop,
}

/// Imports the newest `.json` file in `dir` every `every`.
pub struct AutoImport<'a> {
    db: &'a Database,
    dir: PathBuf,
    source: ImportSource,
    every: Duration,
}

impl<'a> AutoImport<'a> {
    pub fn new(db: &'a Database, dir: &Path, source: ImportSource, every: Duration) -> Self {
        Self {
            db,
            dir: dir.to_path_buf(),
            source,
            every,
        }
    }

    /// Import the newest file once. Failures are logged and returned.
    pub fn run_once(&self) -> Result<ImportSummary> {
        let result = newest_json_in(&self.dir).and_then(|path| import_file(self.db, &path, self.source));
        if let Err(err) = &result {
            tracing::warn!(dir = %self.dir.display(), error = %err, "auto import failed");
        }
        result
    }

    /// Run once right away, then again on every tick or [`Trigger::RunNow`],
    /// until [`Trigger::Stop`] arrives. `on_run` sees every outcome; a failed
    /// run does not end the loop.
    ///
    /// Once every sender is dropped the loop keeps ticking and can only be
    /// ended by the process exiting.
    pub fn watch<F>(&self, triggers: &Receiver<Trigger>, mut on_run: F)
    where
        F: FnMut(&Result<ImportSummary>),
    {
        tracing::info!(
            dir = %self.dir.display(),
            every_secs = self.every.as_secs(),
            source = %self.source,
            "auto import started"
        );
        let mut senders_gone = false;

        loop {
            let result = self.run_once();
            on_run(&result);

            if senders_gone {
                std::thread::sleep(self.every);
                continue;
            }
            match triggers.recv_timeout(self.every) {
                Ok(Trigger::RunNow) | Err(RecvTimeoutError::Timeout) => {}
                Ok(Trigger::Stop) => break,
                Err(RecvTimeoutError::Disconnected) => senders_gone = true,
            }
        }
        tracing::info!(dir = %self.dir.display(), "auto import stopped");
    }
}
