//! Medals and the containers that count them.
//!
//! [`MedalCounts`] holds non-negative tallies (a day's snapshot, the wallet);
//! [`MedalDelta`] holds signed changes between two tallies. Both read missing
//! medals as zero and never store a zero entry, so two containers compare
//! equal exactly when every medal has the same count.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reward tier. Ordered wood < steel < bronze < silver < gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Wood,
    Steel,
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    /// All medals, lowest tier first.
    pub const ALL: [Medal; 5] = [
        Medal::Wood,
        Medal::Steel,
        Medal::Bronze,
        Medal::Silver,
        Medal::Gold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Medal::Wood => "wood",
            Medal::Steel => "steel",
            Medal::Bronze => "bronze",
            Medal::Silver => "silver",
            Medal::Gold => "gold",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medal {
    type Err = ValidationError;

    /// Parse a medal name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Medal::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "medal".to_string(),
                message: format!("unknown medal '{s}'"),
            })
    }
}

/// Non-negative medal tally with zero-default lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Medal, u32>", into = "BTreeMap<Medal, u32>")]
pub struct MedalCounts(BTreeMap<Medal, u32>);

impl MedalCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `medal`, 0 when absent.
    pub fn get(&self, medal: Medal) -> u32 {
        self.0.get(&medal).copied().unwrap_or(0)
    }

    /// Set the count for `medal`; setting 0 removes the entry.
    pub fn set(&mut self, medal: Medal, count: u32) {
        if count == 0 {
            self.0.remove(&medal);
        } else {
            self.0.insert(medal, count);
        }
    }

    /// Add `count` to the tally for `medal`, saturating at `u32::MAX`.
    pub fn add(&mut self, medal: Medal, count: u32) {
        let next = self.get(medal).saturating_add(count);
        self.set(medal, next);
    }

    /// True when every medal reads zero.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all medals.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&c| u64::from(c)).sum()
    }

    /// Non-zero entries in medal order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Medal, u32)> + '_ {
        self.0.iter().map(|(&m, &c)| (m, c))
    }

    /// Signed change from `previous` to `self`, over the union of both key sets.
    pub fn delta_from(&self, previous: &MedalCounts) -> MedalDelta {
        let mut delta = MedalDelta::new();
        for medal in Medal::ALL {
            let change = i64::from(self.get(medal)) - i64::from(previous.get(medal));
            delta.add(medal, change);
        }
        delta
    }

    /// Apply a signed change, failing if any medal would go below zero or
    /// overflow. `self` is left untouched on failure.
    pub fn apply(&mut self, delta: &MedalDelta) -> Result<(), ValidationError> {
        let mut next = self.clone();
        for (medal, change) in delta.iter() {
            let value = i64::from(self.get(medal)) + change;
            if value < 0 {
                return Err(ValidationError::Negative {
                    field: medal.to_string(),
                    value,
                });
            }
            let value = u32::try_from(value).map_err(|_| ValidationError::InvalidValue {
                field: medal.to_string(),
                message: format!("count {value} exceeds the supported range"),
            })?;
            next.set(medal, value);
        }
        *self = next;
        Ok(())
    }
}

impl FromIterator<(Medal, u32)> for MedalCounts {
    fn from_iter<I: IntoIterator<Item = (Medal, u32)>>(iter: I) -> Self {
        let mut counts = MedalCounts::new();
        for (medal, count) in iter {
            counts.add(medal, count);
        }
        counts
    }
}

impl From<BTreeMap<Medal, u32>> for MedalCounts {
    fn from(map: BTreeMap<Medal, u32>) -> Self {
        map.into_iter().collect()
    }
}

impl From<MedalCounts> for BTreeMap<Medal, u32> {
    fn from(counts: MedalCounts) -> Self {
        counts.0
    }
}

impl fmt::Display for MedalCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let parts: Vec<String> = self
            .iter()
            .rev()
            .map(|(medal, count)| format!("{count} {medal}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Signed per-medal change with zero-default lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Medal, i64>", into = "BTreeMap<Medal, i64>")]
pub struct MedalDelta(BTreeMap<Medal, i64>);

impl MedalDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, medal: Medal) -> i64 {
        self.0.get(&medal).copied().unwrap_or(0)
    }

    /// Add `change` to `medal`; an entry that reaches zero is dropped.
    pub fn add(&mut self, medal: Medal, change: i64) {
        let next = self.get(medal) + change;
        if next == 0 {
            self.0.remove(&medal);
        } else {
            self.0.insert(medal, next);
        }
    }

    /// Element-wise sum of `other` into `self`.
    pub fn merge(&mut self, other: &MedalDelta) {
        for (medal, change) in other.iter() {
            self.add(medal, change);
        }
    }

    /// True when every medal's change is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Medal, i64)> + '_ {
        self.0.iter().map(|(&m, &c)| (m, c))
    }
}

impl FromIterator<(Medal, i64)> for MedalDelta {
    fn from_iter<I: IntoIterator<Item = (Medal, i64)>>(iter: I) -> Self {
        let mut delta = MedalDelta::new();
        for (medal, change) in iter {
            delta.add(medal, change);
        }
        delta
    }
}

impl<'a> FromIterator<&'a MedalDelta> for MedalDelta {
    fn from_iter<I: IntoIterator<Item = &'a MedalDelta>>(iter: I) -> Self {
        let mut total = MedalDelta::new();
        for delta in iter {
            total.merge(delta);
        }
        total
    }
}

impl From<BTreeMap<Medal, i64>> for MedalDelta {
    fn from(map: BTreeMap<Medal, i64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<MedalDelta> for BTreeMap<Medal, i64> {
    fn from(delta: MedalDelta) -> Self {
        delta.0
    }
}

impl fmt::Display for MedalDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("no change");
        }
        let parts: Vec<String> = self
            .iter()
            .rev()
            .map(|(medal, change)| format!("{change:+} {medal}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
