//! Plan quality metrics (KPIs).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total minutes | Σ estimated minutes over all rows |
//! | Makespan | Largest per-worker estimated minutes |
//! | Task share | Worker tasks / total tasks |
//! | Load ratio | Worker minutes / makespan |
//! | Smallest batch | Smallest positive row count |

use std::collections::BTreeMap;

use crate::models::{AssignmentPlan, BalanceBand};

/// Share tolerance for band checks.
const SHARE_EPS: f64 = 1e-9;

/// Plan performance indicators.
///
/// All time values are in minutes.
#[derive(Debug, Clone)]
pub struct PlanKpi {
    /// Aggregate person-minutes.
    pub total_minutes: f64,
    /// Largest per-worker time.
    pub makespan_minutes: f64,
    /// Total tasks in the plan.
    pub total_tasks: u64,
    /// Fraction of all tasks per worker (0.0..1.0).
    pub share_by_worker: BTreeMap<String, f64>,
    /// Worker time relative to the makespan (0.0..1.0).
    pub load_ratio_by_worker: BTreeMap<String, f64>,
    /// Mean load ratio across workers in the plan.
    pub avg_load_ratio: f64,
    /// Smallest positive task count of any row. `None` for an empty plan.
    pub smallest_batch: Option<u32>,
}

impl PlanKpi {
    /// Computes KPIs from a plan.
    pub fn calculate(plan: &AssignmentPlan) -> Self {
        let minutes = plan.minutes_by_worker();
        let tasks = plan.tasks_by_worker();
        let total_tasks: u64 = tasks.values().sum();
        let makespan = minutes.values().copied().fold(0.0, f64::max);

        let share_by_worker = tasks
            .iter()
            .map(|(id, &n)| {
                let share = if total_tasks == 0 {
                    0.0
                } else {
                    n as f64 / total_tasks as f64
                };
                (id.clone(), share)
            })
            .collect();

        let load_ratio_by_worker: BTreeMap<String, f64> = minutes
            .iter()
            .map(|(id, &m)| {
                let ratio = if makespan > 0.0 { m / makespan } else { 0.0 };
                (id.clone(), ratio)
            })
            .collect();

        let avg_load_ratio = if load_ratio_by_worker.is_empty() {
            0.0
        } else {
            load_ratio_by_worker.values().sum::<f64>() / load_ratio_by_worker.len() as f64
        };

        Self {
            total_minutes: plan.total_minutes(),
            makespan_minutes: makespan,
            total_tasks,
            share_by_worker,
            load_ratio_by_worker,
            avg_load_ratio,
            smallest_batch: plan.rows.iter().map(|r| r.task_count).min(),
        }
    }

    /// Whether every row holds at least `min_batch` tasks.
    pub fn meets_min_batch(&self, min_batch: u32) -> bool {
        self.smallest_batch.map_or(true, |n| n >= min_batch)
    }

    /// Whether every worker in the plan carries a share inside `band`.
    pub fn within_band(&self, band: &BalanceBand) -> bool {
        self.share_by_worker
            .values()
            .all(|&s| s + SHARE_EPS >= band.lower && s <= band.upper + SHARE_EPS)
    }
}
