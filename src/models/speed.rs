//! Speed observation model.
//!
//! A speed is the average time (minutes) a worker needs to complete one
//! task of a given type. Raw tables may contain gaps, duplicates and
//! non-positive values; the normalizer turns them into a complete table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A (worker, task type, speed) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedRecord {
    /// Worker (auditor) identifier.
    pub worker_id: String,
    /// Task type identifier.
    pub task_type: String,
    /// Minutes per task. `None` = missing observation.
    pub speed: Option<f64>,
    /// Whether the speed was synthesized by imputation.
    pub imputed: bool,
}

impl SpeedRecord {
    /// Creates an observed record.
    pub fn new(worker_id: impl Into<String>, task_type: impl Into<String>, speed: f64) -> Self {
        Self {
            worker_id: worker_id.into(),
            task_type: task_type.into(),
            speed: Some(speed),
            imputed: false,
        }
    }

    /// Creates a record with no speed value.
    pub fn missing(worker_id: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            task_type: task_type.into(),
            speed: None,
            imputed: false,
        }
    }

    /// Creates an imputed record.
    pub fn imputed(worker_id: impl Into<String>, task_type: impl Into<String>, speed: f64) -> Self {
        Self {
            worker_id: worker_id.into(),
            task_type: task_type.into(),
            speed: Some(speed),
            imputed: true,
        }
    }

    /// The speed if it is present and strictly positive.
    #[inline]
    pub fn valid_speed(&self) -> Option<f64> {
        self.speed.filter(|s| s.is_finite() && *s > 0.0)
    }

    /// Whether the speed is present and strictly positive.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid_speed().is_some()
    }
}

/// A table of speed observations.
///
/// Raw tables may hold several records per (worker, task type) pair.
/// After normalization the pair is a unique key and records are sorted
/// by worker, then task type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    /// Speed records.
    pub records: Vec<SpeedRecord>,
}

impl SpeedTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from records.
    pub fn from_records(records: Vec<SpeedRecord>) -> Self {
        Self { records }
    }

    /// Adds a record.
    pub fn with_record(mut self, record: SpeedRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Adds an observed speed.
    pub fn with_speed(
        self,
        worker_id: impl Into<String>,
        task_type: impl Into<String>,
        speed: f64,
    ) -> Self {
        self.with_record(SpeedRecord::new(worker_id, task_type, speed))
    }

    /// Adds a record with a missing speed.
    pub fn with_missing(self, worker_id: impl Into<String>, task_type: impl Into<String>) -> Self {
        self.with_record(SpeedRecord::missing(worker_id, task_type))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct worker IDs, sorted.
    pub fn workers(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.worker_id.as_str()).collect()
    }

    /// Distinct task types, sorted.
    pub fn task_types(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.task_type.as_str()).collect()
    }

    /// First valid speed recorded for a pair.
    pub fn speed(&self, worker_id: &str, task_type: &str) -> Option<f64> {
        self.records
            .iter()
            .filter(|r| r.worker_id == worker_id && r.task_type == task_type)
            .find_map(SpeedRecord::valid_speed)
    }

    /// Finds the record for a pair.
    pub fn record(&self, worker_id: &str, task_type: &str) -> Option<&SpeedRecord> {
        self.records
            .iter()
            .find(|r| r.worker_id == worker_id && r.task_type == task_type)
    }

    /// Returns a copy keeping only records of the given workers.
    pub fn restrict_to<S: AsRef<str>>(&self, workers: &[S]) -> Self {
        let keep: BTreeSet<&str> = workers.iter().map(AsRef::as_ref).collect();
        Self {
            records: self
                .records
                .iter()
                .filter(|r| keep.contains(r.worker_id.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Smallest valid speed in the table.
    pub fn min_positive_speed(&self) -> Option<f64> {
        self.records
            .iter()
            .filter_map(SpeedRecord::valid_speed)
            .min_by(f64::total_cmp)
    }

    /// Smallest valid speed for one task type.
    pub fn min_positive_speed_for(&self, task_type: &str) -> Option<f64> {
        self.records
            .iter()
            .filter(|r| r.task_type == task_type)
            .filter_map(SpeedRecord::valid_speed)
            .min_by(f64::total_cmp)
    }

    /// Median over all present speed values (missing values skipped).
    ///
    /// Returns `None` if no record carries a value.
    pub fn median_speed(&self) -> Option<f64> {
        let mut values: Vec<f64> = self
            .records
            .iter()
            .filter_map(|r| r.speed)
            .filter(|s| !s.is_nan())
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }

    /// Mean valid speed per worker.
    pub fn mean_speed_by_worker(&self) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for r in &self.records {
            if let Some(s) = r.valid_speed() {
                let entry = sums.entry(r.worker_id.as_str()).or_insert((0.0, 0));
                entry.0 += s;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(id, (sum, n))| (id.to_string(), sum / n as f64))
            .collect()
    }

    /// Number of imputed records.
    pub fn imputed_count(&self) -> usize {
        self.records.iter().filter(|r| r.imputed).count()
    }
}
