//! Quota assignment optimizer.
//!
//! Builds and solves a mixed-integer program that splits per-type demand
//! across selected workers, then post-processes the solver output into a
//! plan and a per-worker time summary.
//!
//! # Algorithm
//!
//! 1. Validate the request (selection, demand, configuration).
//! 2. Restrict the speed table to the selected workers and normalize it.
//! 3. Reject obviously infeasible requests (minimum batch, balance band).
//! 4. Build the MILP ([`AssignmentModelBuilder`]) and solve it.
//! 5. Decode integer counts into a sparse [`AssignmentPlan`] and aggregate
//!    a [`WorkerSummary`].
//!
//! Runs are independent: the input table is borrowed immutably and every
//! run owns its normalized copy.
//!
//! # Usage
//!
//! ```
//! use u_assign::models::{DemandVector, Objective, OptimizationConfig, SpeedTable};
//! use u_assign::optimizer::solve;
//!
//! let table = SpeedTable::new()
//!     .with_speed("Ana", "invoice", 2.0)
//!     .with_speed("Beto", "invoice", 4.0)
//!     .with_speed("Caro", "invoice", 3.0);
//! let demand = DemandVector::new().with("invoice", 10);
//! let config = OptimizationConfig::new().with_objective(Objective::Total);
//!
//! let solution = solve(&table, &["Ana", "Beto", "Caro"], &demand, config).unwrap();
//! assert_eq!(solution.plan.tasks_by_type()["invoice"], 10);
//! ```

mod kpi;
mod model;
mod solve;

pub use kpi::PlanKpi;
pub use model::{AssignmentModel, AssignmentModelBuilder, PairVars};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{
    AssignmentPlan, DemandVector, Objective, OptimizationConfig, SpeedTable, WorkerSummary,
};
use crate::normalize::normalize;
use crate::validation::validate_request;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Per-pair quotas.
    pub plan: AssignmentPlan,
    /// Per-worker time totals.
    pub summary: WorkerSummary,
    /// Objective that was minimized.
    pub objective: Objective,
    /// Value of that objective, in minutes.
    pub objective_value: f64,
    /// Normalized speed table the model was built from.
    pub speeds: SpeedTable,
}

/// Input container for an assignment run.
#[derive(Debug, Clone)]
pub struct AssignmentRequest {
    /// Raw speed table (all workers).
    pub speeds: SpeedTable,
    /// Selected worker IDs.
    pub workers: Vec<String>,
    /// Required counts per task type.
    pub demand: DemandVector,
    /// Run configuration.
    pub config: OptimizationConfig,
}

impl AssignmentRequest {
    /// Creates a request with the default configuration.
    pub fn new(speeds: SpeedTable, workers: Vec<String>, demand: DemandVector) -> Self {
        Self {
            speeds,
            workers,
            demand,
            config: OptimizationConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the request.
    pub fn solve(&self) -> Result<Solution> {
        solve(&self.speeds, &self.workers, &self.demand, self.config)
    }
}

/// Normalizes, builds, solves and post-processes one assignment run.
///
/// `table` is the raw speed table; rows of unselected workers are ignored.
///
/// # Errors
/// - `Validation` for malformed requests (nothing is solved)
/// - `Data` if the selected workers have no positive speed at all
/// - `Infeasible` if demand, balance band and minimum batch conflict
/// - `InconsistentSolution` if solver output does not reproduce demand
pub fn solve<S: AsRef<str>>(
    table: &SpeedTable,
    workers: &[S],
    demand: &DemandVector,
    config: OptimizationConfig,
) -> Result<Solution> {
    validate_request(table, workers, demand, &config)?;

    let names: Vec<&str> = workers.iter().map(AsRef::as_ref).collect();
    let speeds = normalize(&table.restrict_to(&names), &config.normalizer)?;

    info!(
        workers = names.len(),
        task_types = demand.len(),
        total_demand = demand.total(),
        objective = %config.objective,
        min_batch = config.min_batch,
        "solving assignment"
    );

    let builder = AssignmentModelBuilder::new(&speeds, &names, demand, config);
    let plan = builder
        .build()
        .and_then(AssignmentModel::solve)
        .inspect_err(|e| warn!(error = %e, "assignment failed"))?;

    let objective_value = match config.objective {
        Objective::Total => plan.total_minutes(),
        Objective::Makespan => plan.makespan_minutes(),
    };
    let summary = plan.summary();

    info!(rows = plan.row_count(), objective_value, "assignment solved");

    Ok(Solution {
        plan,
        summary,
        objective: config.objective,
        objective_value,
        speeds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssignError, InfeasibleCause};
    use crate::models::BalanceBand;
    use crate::normalize::ingest;
    use crate::validation::ValidationErrorKind;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn wide_band() -> BalanceBand {
        BalanceBand::new(0.05, 0.6)
    }

    #[test]
    fn test_two_workers_exceed_default_cap() {
        // Ana is cheaper, but 2 workers × 40% of 10 = 8 < 10.
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 4.0);
        let demand = DemandVector::new().with("invoice", 10);

        let err = solve(&table, &["Ana", "Beto"], &demand, OptimizationConfig::default())
            .unwrap_err();
        assert_eq!(err.infeasible_cause(), Some(InfeasibleCause::BalanceBand));
    }

    #[test]
    fn test_cap_binds_on_cheapest_worker() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 4.0);
        let demand = DemandVector::new().with("invoice", 10);
        let config = OptimizationConfig::default().with_balance(wide_band());

        let solution = solve(&table, &["Ana", "Beto"], &demand, config).unwrap();
        assert_eq!(solution.plan.task_count("Ana", "invoice"), 6);
        assert_eq!(solution.plan.task_count("Beto", "invoice"), 4);
        assert!((solution.objective_value - 28.0).abs() < 1e-6);
    }

    #[test]
    fn test_makespan_equal_speeds_even_split() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 2.0);
        let demand = DemandVector::new().with("invoice", 10);
        let config = OptimizationConfig::default()
            .with_objective(Objective::Makespan)
            .with_balance(wide_band());

        let solution = solve(&table, &["Ana", "Beto"], &demand, config).unwrap();
        assert_eq!(solution.plan.task_count("Ana", "invoice"), 5);
        assert_eq!(solution.plan.task_count("Beto", "invoice"), 5);
        assert!((solution.objective_value - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_makespan_balances_unequal_speeds() {
        // Loads: Ana 1·a, Beto 2·b, Caro 4·c with a + b + c = 14 and a <= 7.
        // Under 10 minutes at most 7 + 4 + 2 = 13 tasks fit; 7 + 5 + 2 reaches 10.
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 1.0)
            .with_speed("Beto", "invoice", 2.0)
            .with_speed("Caro", "invoice", 4.0);
        let demand = DemandVector::new().with("invoice", 14);
        let config = OptimizationConfig::default()
            .with_objective(Objective::Makespan)
            .with_balance(BalanceBand::new(0.1, 0.5));

        let solution = solve(&table, &["Ana", "Beto", "Caro"], &demand, config).unwrap();
        assert!((solution.objective_value - 10.0).abs() < 1e-6);
        assert_eq!(solution.plan.tasks_by_type()["invoice"], 14);
    }

    #[test]
    fn test_imputed_speed_is_penalized_type_minimum() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 4.0)
            .with_speed("Caro", "invoice", 0.0)
            .with_speed("Caro", "receipt", 3.0);
        let demand = DemandVector::new().with("invoice", 10);

        let solution = solve(
            &table,
            &["Ana", "Beto", "Caro"],
            &demand,
            OptimizationConfig::default(),
        )
        .unwrap();
        let caro = solution.speeds.record("Caro", "invoice").unwrap();
        assert!(caro.imputed);
        assert!((caro.speed.unwrap() - 2.4).abs() < 1e-10);
        if let Some(row) = solution.plan.row("Caro", "invoice") {
            assert!((row.speed - 2.4).abs() < 1e-10);
        }
    }

    #[test]
    fn test_single_worker_below_min_batch_is_infeasible() {
        let table = SpeedTable::new().with_speed("Ana", "A", 1.0);
        let demand = DemandVector::new().with("A", 2);
        let config = OptimizationConfig::default().with_min_batch(6);

        let err = solve(&table, &["Ana"], &demand, config).unwrap_err();
        assert!(matches!(err, AssignError::Infeasible { .. }));
        assert_eq!(err.infeasible_cause(), Some(InfeasibleCause::MinimumBatch));
    }

    #[test]
    fn test_min_batch_respected() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 1.0)
            .with_speed("Ana", "receipt", 1.5)
            .with_speed("Beto", "invoice", 2.0)
            .with_speed("Beto", "receipt", 1.0)
            .with_speed("Caro", "invoice", 3.0)
            .with_speed("Caro", "receipt", 2.5);
        let demand = DemandVector::new().with("invoice", 12).with("receipt", 9);
        let config = OptimizationConfig::default().with_min_batch(4);

        let solution = solve(&table, &["Ana", "Beto", "Caro"], &demand, config).unwrap();
        let kpi = PlanKpi::calculate(&solution.plan);
        assert!(kpi.meets_min_batch(4));
        assert!(kpi.within_band(&config.balance));
        assert_eq!(solution.plan.tasks_by_type()["invoice"], 12);
        assert_eq!(solution.plan.tasks_by_type()["receipt"], 9);
    }

    #[test]
    fn test_unselected_workers_ignored() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 3.0)
            .with_speed("Caro", "invoice", 4.0)
            .with_speed("Flash", "invoice", 0.5);
        let demand = DemandVector::new().with("invoice", 10);

        let solution = solve(
            &table,
            &["Ana", "Beto", "Caro"],
            &demand,
            OptimizationConfig::default(),
        )
        .unwrap();
        assert!(solution.plan.rows_for_worker("Flash").is_empty());
        assert!(!solution.speeds.workers().contains("Flash"));
    }

    #[test]
    fn test_validation_before_solving() {
        let table = SpeedTable::new().with_speed("Ana", "invoice", 2.0);
        let demand = DemandVector::new().with("invoice", 3);
        let none: [&str; 0] = [];

        let err = solve(&table, &none, &demand, OptimizationConfig::default()).unwrap_err();
        assert!(err
            .validation_errors()
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptySelection));
    }

    #[test]
    fn test_demand_covered_only_by_unselected_worker() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 3.0)
            .with_speed("Caro", "invoice", 4.0)
            .with_speed("Zoe", "receipt", 1.0);
        let demand = DemandVector::new().with("invoice", 10).with("receipt", 5);

        let err = solve(
            &table,
            &["Ana", "Beto", "Caro"],
            &demand,
            OptimizationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AssignError::Validation(_)));
        assert!(err
            .validation_errors()
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownTaskType && e.message.contains("receipt")));
    }

    #[test]
    fn test_no_positive_speed_is_data_error() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 0.0)
            .with_missing("Beto", "invoice")
            .with_speed("Caro", "invoice", 5.0);
        let demand = DemandVector::new().with("invoice", 3);

        // Caro has data, but is not selected.
        let err = solve(&table, &["Ana", "Beto"], &demand, OptimizationConfig::default())
            .unwrap_err();
        assert!(matches!(err, AssignError::Data(_)));
    }

    #[test]
    fn test_summary_matches_plan() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 30.0)
            .with_speed("Beto", "invoice", 45.0)
            .with_speed("Caro", "invoice", 60.0);
        let demand = DemandVector::new().with("invoice", 10);

        let solution = solve(
            &table,
            &["Ana", "Beto", "Caro"],
            &demand,
            OptimizationConfig::default(),
        )
        .unwrap();
        // Ana 4 × 30 = 120, Beto 4 × 45 = 180, Caro 2 × 60 = 120
        assert_eq!(solution.summary.len(), 3);
        assert_eq!(solution.summary.row("Ana").unwrap().hh_mm, "02:00");
        assert_eq!(solution.summary.row("Beto").unwrap().hh_mm, "03:00");
        assert_eq!(solution.summary.row("Caro").unwrap().hh_mm, "02:00");
    }

    #[test]
    fn test_ingested_rows_end_to_end() {
        let headers = ["Auditor", "Task_Type", "Avg_Speed"];
        let rows = vec![
            vec!["Ana", "invoice", "0,002"],
            vec!["Beto", "invoice", "0,003"],
            vec!["Caro", "invoice", ""],
            vec!["Caro", "receipt", "0,004"],
        ];
        let table = ingest(&headers, &rows).unwrap();
        let demand = DemandVector::parse([("invoice", "10"), ("receipt", "")]).unwrap();

        let request = AssignmentRequest::new(
            table,
            vec!["Ana".into(), "Beto".into(), "Caro".into()],
            demand,
        );
        let solution = request.solve().unwrap();
        assert_eq!(solution.plan.tasks_by_type()["invoice"], 10);
        // 0.002 days = 2.88 minutes
        assert!((solution.speeds.speed("Ana", "invoice").unwrap() - 2.88).abs() < 1e-9);
    }

    #[test]
    fn test_solution_json() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 2.0)
            .with_speed("Beto", "invoice", 3.0)
            .with_speed("Caro", "invoice", 4.0);
        let demand = DemandVector::new().with("invoice", 5);
        let solution = solve(
            &table,
            &["Ana", "Beto", "Caro"],
            &demand,
            OptimizationConfig::default(),
        )
        .unwrap();

        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["objective"], "total");
        assert!(json["plan"]["rows"].is_array());
        assert!(json["summary"]["rows"][0]["hh_mm"].is_string());
    }

    #[test]
    fn test_random_plans_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let workers = ["Ana", "Beto", "Caro", "Dani"];
        let types = ["invoice", "receipt", "ledger"];

        for _ in 0..10 {
            let mut table = SpeedTable::new();
            for w in workers {
                for t in types {
                    table = if rng.random_bool(0.8) {
                        table.with_speed(w, t, rng.random_range(0.5..20.0))
                    } else {
                        table.with_missing(w, t)
                    };
                }
            }
            table = table.with_speed("Ana", "invoice", 3.0);

            let demand: DemandVector = types
                .iter()
                .map(|&t| (t, rng.random_range(5..=15u32)))
                .collect();
            let objective = if rng.random_bool(0.5) {
                Objective::Total
            } else {
                Objective::Makespan
            };
            let min_batch = rng.random_range(0..=3u32);
            let config = OptimizationConfig::default()
                .with_objective(objective)
                .with_min_batch(min_batch);

            let solution = match solve(&table, &workers, &demand, config) {
                Ok(solution) => solution,
                Err(AssignError::Infeasible { .. }) => continue,
                Err(other) => panic!("unexpected error: {other}"),
            };

            let by_type = solution.plan.tasks_by_type();
            for (t, n) in demand.iter() {
                assert_eq!(by_type.get(t).copied().unwrap_or(0), u64::from(n));
            }

            let (lo, hi) = config.balance.bounds(demand.total());
            for (_, n) in solution.plan.tasks_by_worker() {
                assert!(n as f64 >= lo - 1e-9 && n as f64 <= hi + 1e-9);
            }

            let kpi = PlanKpi::calculate(&solution.plan);
            assert!(kpi.meets_min_batch(min_batch));
            assert_eq!(
                solution.summary.len(),
                solution.plan.tasks_by_worker().len()
            );
        }
    }
}
