//! TOML-based reward configuration.
//!
//! Stores:
//! - Day types and their focus goals
//! - The weekday calendar
//! - The fallback rest time
//! - Experience levels
//! - Import preferences
//!
//! Configuration is stored at `~/.config/medalroom/config.toml`. The raw
//! file is kept as plain strings and numbers; [`Config::validate`] resolves it
//! into the typed [`RewardSettings`] the engine works with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::goals::{Calendar, DayType, FocusGoal};
use crate::medal::Medal;
use crate::stats::Level;

const MINUTES_PER_DAY: u32 = 1440;
const TIME_FORMAT: &str = "%H:%M";

/// One focus goal as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusGoalConfig {
    pub minutes: u32,
    pub medal: String,
    #[serde(default = "default_count")]
    pub count: u32,
    pub rest_after: String,
}

/// A named bundle of focus goals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTypeConfig {
    #[serde(default)]
    pub focus_goals: Vec<FocusGoalConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    pub name: String,
    /// Total focused minutes required.
    pub threshold: u64,
}

/// Import preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_import_source")]
    pub source: String,
    /// Directory scanned by `import --latest` and `import --watch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Interval between `import --watch` runs, e.g. `30s`, `15m` or `1h30m`.
    #[serde(default = "default_import_every")]
    pub every: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/medalroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Rest time used when no reached goal unlocks an earlier one.
    #[serde(default = "default_always_rest_after")]
    pub always_rest_after: String,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub day_types: BTreeMap<String, DayTypeConfig>,
    /// Weekday (`mon`..`sun`) to day type name.
    #[serde(default)]
    pub calendar: BTreeMap<String, String>,
    #[serde(default)]
    pub levels: Vec<LevelConfig>,
}

/// Validated configuration in engine types.
#[derive(Debug, Clone)]
pub struct RewardSettings {
    pub calendar: Calendar,
    pub fallback_rest: NaiveTime,
    /// Sorted by threshold ascending.
    pub levels: Vec<Level>,
}

fn default_count() -> u32 {
    1
}
fn default_import_source() -> String {
    "spbackup".into()
}
fn default_import_every() -> String {
    "15m".into()
}
fn default_always_rest_after() -> String {
    "22:00".into()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source: default_import_source(),
            dir: None,
            every: default_import_every(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let goal = |minutes: u32, medal: &str, rest_after: &str| FocusGoalConfig {
            minutes,
            medal: medal.into(),
            count: 1,
            rest_after: rest_after.into(),
        };
        let workday = DayTypeConfig {
            focus_goals: vec![
                goal(150, "bronze", "18:00"),
                goal(240, "silver", "17:00"),
                goal(360, "gold", "16:00"),
            ],
        };
        let calendar = ["mon", "tue", "wed", "thu", "fri"]
            .into_iter()
            .map(|day| (day.to_string(), "workday".to_string()))
            .collect();
        let levels = vec![
            LevelConfig {
                level: 1,
                name: "Apprentice".into(),
                threshold: 0,
            },
            LevelConfig {
                level: 2,
                name: "Journeyman".into(),
                threshold: 6_000,
            },
            LevelConfig {
                level: 3,
                name: "Master".into(),
                threshold: 30_000,
            },
        ];

        Self {
            always_rest_after: default_always_rest_after(),
            import: ImportConfig::default(),
            day_types: BTreeMap::from([("workday".to_string(), workday)]),
            calendar,
            levels,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let new_value = match obj.get(part) {
                Some(serde_json::Value::Number(_)) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                Some(serde_json::Value::Object(_) | serde_json::Value::Array(_)) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                Some(_) => serde_json::Value::String(value.into()),
                // Optional fields are omitted while unset
                None if part == "dir" => serde_json::Value::String(value.into()),
                None => return Err(unknown()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file in the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default config if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                tracing::info!(path = %path.display(), "wrote default config");
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result must still
    /// validate; nothing is changed otherwise.
    ///
    /// Does not save; call [`Config::save`] afterwards.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Resolve into engine types, reporting the first offending key.
    pub fn validate(&self) -> Result<RewardSettings, ConfigError> {
        let fallback_rest = parse_time("always_rest_after", &self.always_rest_after)?;
        self.import.interval()?;

        let mut day_types = BTreeMap::new();
        for (name, raw) in &self.day_types {
            day_types.insert(name.as_str(), resolve_day_type(name, raw)?);
        }

        let mut calendar = Calendar::new();
        for (day, type_name) in &self.calendar {
            let key = format!("calendar.{day}");
            let weekday = parse_weekday(&key, day)?;
            let day_type = day_types.get(type_name.as_str()).ok_or_else(|| ConfigError::InvalidValue {
                key,
                message: format!("unknown day type '{type_name}'"),
            })?;
            calendar.insert(weekday, day_type.clone());
        }

        let mut levels: Vec<Level> = self
            .levels
            .iter()
            .map(|l| Level {
                level: l.level,
                name: l.name.clone(),
                threshold_minutes: l.threshold,
            })
            .collect();
        levels.sort_by_key(|l| (l.threshold_minutes, l.level));

        Ok(RewardSettings {
            calendar,
            fallback_rest,
            levels,
        })
    }
}

impl ImportConfig {
    /// The parsed `every` interval.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        parse_interval("import.every", &self.every)
    }
}

fn resolve_day_type(name: &str, raw: &DayTypeConfig) -> Result<DayType, ConfigError> {
    let mut focus_goals = Vec::with_capacity(raw.focus_goals.len());
    for (i, goal) in raw.focus_goals.iter().enumerate() {
        let key = |field: &str| format!("day_types.{name}.focus_goals[{i}].{field}");

        let medal: Medal = goal.medal.parse().map_err(|_| ConfigError::InvalidValue {
            key: key("medal"),
            message: format!("unknown medal '{}'", goal.medal),
        })?;
        check_range(key("minutes"), goal.minutes)?;
        check_range(key("count"), goal.count)?;
        let rest_unlock = parse_time(&key("rest_after"), &goal.rest_after)?;

        focus_goals.push(FocusGoal::new(goal.minutes, medal, goal.count, rest_unlock));
    }
    Ok(DayType {
        name: name.to_string(),
        focus_goals,
    })
}

fn check_range(key: String, value: u32) -> Result<(), ConfigError> {
    if value > MINUTES_PER_DAY {
        return Err(ConfigError::InvalidValue {
            key,
            message: format!("{value} is outside 0..={MINUTES_PER_DAY}"),
        });
    }
    Ok(())
}

fn parse_time(key: &str, raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}' is not a HH:MM time"),
    })
}

/// Parse `<n>h`, `<n>m` and `<n>s` parts, e.g. `1h30m`. Must be positive.
fn parse_interval(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };
    let malformed = || invalid(format!("'{raw}' is not a duration like 30s, 15m or 1h30m"));

    let mut seconds: u64 = 0;
    let mut digits = String::new();
    for c in raw.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c.to_ascii_lowercase() {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(malformed()),
        };
        let n: u64 = digits.parse().map_err(|_| malformed())?;
        seconds = n
            .checked_mul(unit)
            .and_then(|part| seconds.checked_add(part))
            .ok_or_else(malformed)?;
        digits.clear();
    }
    if !digits.is_empty() || raw.trim().is_empty() {
        return Err(malformed());
    }
    if seconds == 0 {
        return Err(invalid("interval must be positive".to_string()));
    }
    Ok(Duration::from_secs(seconds))
}

fn parse_weekday(key: &str, raw: &str) -> Result<Weekday, ConfigError> {
    let weekday = match raw.trim().to_ascii_lowercase().as_str() {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}' is not one of mon..sun"),
            })
        }
    };
    Ok(weekday)
}
