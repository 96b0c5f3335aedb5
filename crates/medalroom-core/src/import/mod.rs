//! Import of focus timers recorded by other apps.

mod auto;
mod super_productivity;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};
use crate::rewards::RewardStore;
use crate::storage::{Database, NewTimer};

pub use auto::{AutoImport, Trigger};
pub use super_productivity::parse as parse_super_productivity;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    /// Super Productivity "export data" file.
    SpExport,
    /// Super Productivity automatic backup.
    SpBackup,
}

impl ImportSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportSource::SpExport => "spexport",
            ImportSource::SpBackup => "spbackup",
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportSource {
    type Err = ImportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spexport" => Ok(ImportSource::SpExport),
            "spbackup" => Ok(ImportSource::SpBackup),
            other => Err(ImportError::UnknownSource(other.to_string())),
        }
    }
}

/// Outcome of importing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub path: PathBuf,
    pub source: ImportSource,
    /// Timers inserted or updated.
    pub timers: usize,
    pub focused_ms: i64,
}

/// Read timers from `path` in the given format without storing them.
pub fn read_timers(path: &Path, source: ImportSource) -> Result<Vec<NewTimer>> {
    let file = File::open(path)?;
    Ok(super_productivity::parse(BufReader::new(file), source)?)
}

/// Import every timer in `path` into `db`.
///
/// Timers are upserted by external id, so importing the same file twice
/// leaves the database unchanged. Either every timer is stored or none is.
pub fn import_file(db: &Database, path: &Path, source: ImportSource) -> Result<ImportSummary> {
    let timers = read_timers(path, source)?;

    db.atomically(|| {
        for timer in &timers {
            db.save_timer(timer)?;
        }
        Ok(())
    })?;

    let summary = ImportSummary {
        path: path.to_path_buf(),
        source,
        timers: timers.len(),
        focused_ms: timers.iter().map(|t| t.spent_ms).sum(),
    };
    tracing::info!(path = %path.display(), %source, timers = summary.timers, "import finished");
    Ok(summary)
}

/// The most recently modified `.json` file directly inside `dir`.
pub fn newest_json_in(dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json || !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| ImportError::NoCandidates(dir.to_path_buf()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::FocusTimeSource;
    use chrono::NaiveDate;

    const BACKUP: &str = r#"{
        "task": { "entities": {
            "a": { "title": "Focus", "timeSpentOnDay": { "2025-03-03": 3600000 } },
            "b": { "title": "More", "timeSpentOnDay": { "2025-03-03": 1800000 } }
        } }
    }"#;

    #[test]
    fn source_names_parse_case_insensitively() {
        assert_eq!("SPExport".parse::<ImportSource>().unwrap(), ImportSource::SpExport);
        assert_eq!(" spbackup ".parse::<ImportSource>().unwrap(), ImportSource::SpBackup);
        assert!("csv".parse::<ImportSource>().is_err());
        assert_eq!(ImportSource::SpBackup.to_string(), "spbackup");
    }

    #[test]
    fn reimport_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, BACKUP).unwrap();
        let db = Database::open_memory().unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        let first = import_file(&db, &path, ImportSource::SpBackup).unwrap();
        import_file(&db, &path, ImportSource::SpBackup).unwrap();

        assert_eq!(first.timers, 2);
        assert_eq!(first.focused_ms, 5_400_000);
        assert_eq!(db.sum_focused_seconds(monday).unwrap(), 5400);
        assert_eq!(db.list_timers(10).unwrap().len(), 2);
    }

    #[test]
    fn malformed_file_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let db = Database::open_memory().unwrap();

        assert!(import_file(&db, &path, ImportSource::SpBackup).is_err());
        assert!(db.list_timers(10).unwrap().is_empty());
    }

    #[test]
    fn newest_json_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(newest_json_in(dir.path()).is_err());

        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let older = dir.path().join("older.json");
        let newer = dir.path().join("newer.json");
        std::fs::write(&older, "{}").unwrap();
        std::fs::write(&newer, "{}").unwrap();
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert_eq!(newest_json_in(dir.path()).unwrap(), newer);
    }

    #[test]
    fn newest_json_takes_single_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();
        let only = dir.path().join("BACKUP.JSON");
        std::fs::write(&only, "{}").unwrap();

        assert_eq!(newest_json_in(dir.path()).unwrap(), only);
    }
}
