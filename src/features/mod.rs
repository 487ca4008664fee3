//! Feature aggregation: structured records → time windows → event count matrix.

mod event_count;
mod windowing;

pub use event_count::EventCountMatrix;
pub use windowing::Windower;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One structured log record from the upstream parser. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub ts: DateTime<Utc>,
    /// Normalized event template assigned upstream, treated as a categorical feature
    pub event_template: String,
    /// Remaining parsed fields, kept for downstream consumers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl LogRecord {
    pub fn new(ts: DateTime<Utc>, event_template: impl Into<String>) -> Self {
        Self {
            ts,
            event_template: event_template.into(),
            fields: BTreeMap::new(),
        }
    }
}

/// A fixed-duration time bucket of records. `key` is the floor-aligned start
/// of the window; all contained records satisfy `key <= ts < key + window_size`.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    pub key: DateTime<Utc>,
    pub records: Vec<LogRecord>,
}
