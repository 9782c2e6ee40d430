//! Local append-only measurement log.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::record::{Row, Timestamp};
use corelib::Identifier;

/// Time series keyed by record key, then timestamp.
///
/// Appending the same `(key, timestamp)` twice keeps one row, so replaying a
/// poll is harmless.
pub trait MeasurementLog: Send + Sync + 'static {
    fn append(&self, key: Identifier, timestamp: Timestamp, value: f64);

    /// Rows for `key` strictly newer than `since`, oldest first.
    fn newer_than(&self, key: Identifier, since: Timestamp) -> Vec<Row>;
}

#[derive(Debug, Default)]
pub struct MemoryLog {
    series: DashMap<Identifier, BTreeMap<Timestamp, f64>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows stored for `key`.
    pub fn len(&self, key: Identifier) -> usize {
        self.series.get(&key).map_or(0, |s| s.len())
    }
}

impl MeasurementLog for MemoryLog {
    fn append(&self, key: Identifier, timestamp: Timestamp, value: f64) {
        self.series.entry(key).or_default().insert(timestamp, value);
    }

    fn newer_than(&self, key: Identifier, since: Timestamp) -> Vec<Row> {
        let Some(series) = self.series.get(&key) else {
            return Vec::new();
        };
        series
            .range((Bound::Excluded(since), Bound::Unbounded))
            .map(|(&timestamp, &value)| Row { timestamp, value })
            .collect()
    }
}
