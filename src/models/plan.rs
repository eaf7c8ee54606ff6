//! Assignment plan (solution) model.
//!
//! A plan lists how many tasks of each type every worker receives, with
//! the speed used and the resulting estimated time. The worker summary
//! aggregates estimated time per worker for display.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A worker × task type quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    /// Assigned worker ID.
    pub worker_id: String,
    /// Task type.
    pub task_type: String,
    /// Number of tasks assigned (always > 0 in a plan).
    pub task_count: u32,
    /// Minutes per task used by the model.
    pub speed: f64,
    /// `task_count × speed`, in minutes.
    pub estimated_minutes: f64,
}

impl PlanRow {
    /// Creates a row, computing the estimated minutes.
    pub fn new(
        worker_id: impl Into<String>,
        task_type: impl Into<String>,
        task_count: u32,
        speed: f64,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            task_type: task_type.into(),
            task_count,
            speed,
            estimated_minutes: f64::from(task_count) * speed,
        }
    }
}

/// A complete assignment plan.
///
/// Sparse: pairs with zero tasks have no row. Rows are ordered by
/// worker, then task type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPlan {
    /// Plan rows.
    pub rows: Vec<PlanRow>,
}

impl AssignmentPlan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row.
    pub fn add_row(&mut self, row: PlanRow) {
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the plan has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds the row for a pair.
    pub fn row(&self, worker_id: &str, task_type: &str) -> Option<&PlanRow> {
        self.rows
            .iter()
            .find(|r| r.worker_id == worker_id && r.task_type == task_type)
    }

    /// Tasks of a type assigned to a worker (0 if no row).
    pub fn task_count(&self, worker_id: &str, task_type: &str) -> u32 {
        self.row(worker_id, task_type).map_or(0, |r| r.task_count)
    }

    /// Returns all rows for a worker.
    pub fn rows_for_worker(&self, worker_id: &str) -> Vec<&PlanRow> {
        self.rows.iter().filter(|r| r.worker_id == worker_id).collect()
    }

    /// Returns all rows for a task type.
    pub fn rows_for_task_type(&self, task_type: &str) -> Vec<&PlanRow> {
        self.rows.iter().filter(|r| r.task_type == task_type).collect()
    }

    /// Total tasks per task type.
    pub fn tasks_by_type(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for r in &self.rows {
            *totals.entry(r.task_type.clone()).or_insert(0) += u64::from(r.task_count);
        }
        totals
    }

    /// Total tasks per worker.
    pub fn tasks_by_worker(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for r in &self.rows {
            *totals.entry(r.worker_id.clone()).or_insert(0) += u64::from(r.task_count);
        }
        totals
    }

    /// Estimated minutes per worker.
    pub fn minutes_by_worker(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for r in &self.rows {
            *totals.entry(r.worker_id.clone()).or_insert(0.0) += r.estimated_minutes;
        }
        totals
    }

    /// Sum of estimated minutes over all rows.
    pub fn total_minutes(&self) -> f64 {
        self.rows.iter().map(|r| r.estimated_minutes).sum()
    }

    /// Largest per-worker estimated time (0 for an empty plan).
    pub fn makespan_minutes(&self) -> f64 {
        self.minutes_by_worker()
            .into_values()
            .fold(0.0, f64::max)
    }

    /// Aggregates the plan into a per-worker time summary.
    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            rows: self
                .minutes_by_worker()
                .into_iter()
                .map(|(worker_id, minutes)| SummaryRow::new(worker_id, minutes))
                .collect(),
        }
    }
}

/// Total estimated time for one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Worker ID.
    pub worker_id: String,
    /// Total estimated minutes.
    pub total_minutes: f64,
    /// `HH:mm` rendering of the total.
    pub hh_mm: String,
}

impl SummaryRow {
    /// Creates a row, formatting the total.
    pub fn new(worker_id: impl Into<String>, total_minutes: f64) -> Self {
        Self {
            worker_id: worker_id.into(),
            total_minutes,
            hh_mm: format_hh_mm(total_minutes),
        }
    }
}

/// Per-worker time summary, one row per worker present in the plan.
///
/// `hh_mm` is a clock-style display and wraps at 24 hours, so a load of
/// 1500 minutes reads `01:00`. Use [`SummaryRow::total_minutes`] for loads
/// that may exceed a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSummary {
    /// Summary rows, ordered by worker.
    pub rows: Vec<SummaryRow>,
}

impl WorkerSummary {
    /// Finds the row for a worker.
    pub fn row(&self, worker_id: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.worker_id == worker_id)
    }

    /// Number of workers.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the summary is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Formats minutes as zero-padded `HH:mm`.
///
/// Uses the hour and minute components of the duration: hours wrap at a
/// day and the fractional minute is dropped. Negative or non-finite input
/// renders as `00:00`.
///
/// # Example
/// ```
/// use u_assign::models::format_hh_mm;
///
/// assert_eq!(format_hh_mm(125.0), "02:05");
/// assert_eq!(format_hh_mm(59.9), "00:59");
/// ```
pub fn format_hh_mm(minutes: f64) -> String {
    let whole = if minutes.is_finite() && minutes > 0.0 {
        minutes.floor() as u64
    } else {
        0
    };
    let hours = (whole / 60) % 24;
    let mins = whole % 60;
    format!("{hours:02}:{mins:02}")
}
