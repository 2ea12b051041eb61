//! Result record schema written to `meta.json` for every completed run.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Resource type (e.g. "LUT", "DFF") -> used count.
pub type ResourceCounts = BTreeMap<String, u64>;

/// Tool name -> free-form version string.
pub type VersionInfo = BTreeMap<String, String>;

/// Stage name -> elapsed wall time in seconds, in execution order.
///
/// Recording a name a second time replaces the earlier duration but keeps the
/// entry at the position of its first insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeRecord {
    entries: IndexMap<String, f64>,
}

impl RuntimeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `secs` under `name`, returning the duration it replaced, if any.
    pub fn record(&mut self, name: impl Into<String>, secs: f64) -> Option<f64> {
        self.entries.insert(name.into(), secs)
    }

    /// Seconds recorded for `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).copied()
    }

    /// True once `name` has been timed.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of distinct stage names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, seconds)` pairs in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Canonical per-run output.
///
/// Fields are declared in lexicographic order so the serialized object has
/// sorted top-level keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub device: String,
    pub family: String,
    /// Achieved clock frequency in Hz; `None` when the timing report had no delay line.
    pub max_freq: Option<f64>,
    pub project_name: String,
    pub resources: ResourceCounts,
    pub runtime: RuntimeRecord,
    pub sources: Vec<String>,
    pub toolchain: String,
    pub top: String,
    pub versions: VersionInfo,
}
