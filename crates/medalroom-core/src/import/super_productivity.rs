//! Super Productivity export and backup files.
//!
//! Both formats carry the same data object; an export wraps it in a
//! `{"data": ...}` envelope. Tasks live in `task`, `archiveYoung.task` and
//! `archiveOld.task`, each with a `timeSpentOnDay` map of date to
//! milliseconds. Every non-empty day of every task becomes one timer.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;

use super::ImportSource;
use crate::error::ImportError;
use crate::storage::NewTimer;

const EXTERNAL_PREFIX: &str = "SuperProductivity";

#[derive(Debug, Deserialize)]
struct ExportFile {
    data: DataContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataContent {
    #[serde(default)]
    task: TaskState,
    #[serde(default)]
    archive_old: ArchiveState,
    #[serde(default)]
    archive_young: ArchiveState,
}

#[derive(Debug, Default, Deserialize)]
struct ArchiveState {
    #[serde(default)]
    task: TaskState,
}

#[derive(Debug, Default, Deserialize)]
struct TaskState {
    #[serde(default)]
    entities: HashMap<String, TaskEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskEntity {
    #[serde(default)]
    title: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    time_spent_on_day: HashMap<String, f64>,
}

/// Timers found in `reader`, ordered by external id.
///
/// A task present in several places is taken from the newest one: the active
/// list wins over `archiveYoung`, which wins over `archiveOld`.
pub fn parse<R: Read>(reader: R, source: ImportSource) -> Result<Vec<NewTimer>, ImportError> {
    let decode = |e: serde_json::Error| ImportError::Decode {
        source_name: source.to_string(),
        message: e.to_string(),
    };
    let data = match source {
        ImportSource::SpExport => serde_json::from_reader::<_, ExportFile>(reader).map_err(decode)?.data,
        ImportSource::SpBackup => serde_json::from_reader::<_, DataContent>(reader).map_err(decode)?,
    };

    let mut tasks: HashMap<String, TaskEntity> = data.archive_old.task.entities;
    tasks.extend(data.archive_young.task.entities);
    tasks.extend(data.task.entities);

    let mut timers = BTreeMap::new();
    for (task_id, task) in tasks {
        for (day, ms) in task.time_spent_on_day {
            let fixated_on = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| ImportError::Decode {
                source_name: source.to_string(),
                message: format!("task {task_id}: bad date '{day}': {e}"),
            })?;
            let spent_ms = ms.round() as i64;
            if spent_ms <= 0 {
                tracing::debug!(%task_id, %day, "skipping day without recorded time");
                continue;
            }

            let external_id = format!("{EXTERNAL_PREFIX}:{task_id}:{day}");
            timers.insert(
                external_id.clone(),
                NewTimer {
                    external_id: Some(external_id),
                    name: task.title.clone(),
                    description: task.notes.clone().unwrap_or_default(),
                    fixated_on,
                    spent_ms,
                },
            );
        }
    }
    Ok(timers.into_values().collect())
}
