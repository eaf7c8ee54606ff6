//! Solving and decoding.
//!
//! Hands a built [`AssignmentModel`] to the `good_lp` default solver
//! (selected by cargo feature) and turns integer values back into a
//! sparse [`AssignmentPlan`].

use std::collections::BTreeMap;

use good_lp::{default_solver, Solution, SolverModel};
use tracing::{debug, warn};

use super::model::AssignmentModel;
use crate::error::{AssignError, InfeasibleCause, Result};
use crate::models::{AssignmentPlan, PlanRow};

/// Largest distance from an integer tolerated in solver output.
const INTEGRALITY_TOLERANCE: f64 = 1e-4;

impl AssignmentModel {
    /// Solves the model and decodes the plan.
    ///
    /// # Errors
    /// - `Infeasible` (cause `Solver`) if the solver does not report an
    ///   optimal solution. No partial plan is returned.
    /// - `InconsistentSolution` if rounded counts do not match demand.
    pub fn solve(self) -> Result<AssignmentPlan> {
        let AssignmentModel {
            vars,
            objective,
            constraints,
            pairs,
            ..
        } = self;

        if pairs.is_empty() {
            debug!("nothing to assign");
            return Ok(AssignmentPlan::new());
        }

        let mut problem = vars.minimise(objective).using(default_solver);
        #[cfg(feature = "coin_cbc")]
        problem.set_parameter("log", "0");
        for constraint in constraints {
            problem.add_constraint(constraint);
        }

        let solution = problem.solve().map_err(|e| {
            warn!(error = %e, "solver found no optimal assignment");
            AssignError::infeasible(
                InfeasibleCause::Solver,
                format!(
                    "no optimal assignment ({e}); check demand against the balance band \
                     and minimum batch"
                ),
            )
        })?;

        let mut plan = AssignmentPlan::new();
        let mut assigned: BTreeMap<&str, u32> = BTreeMap::new();
        let mut demand: BTreeMap<&str, u32> = BTreeMap::new();

        for p in &pairs {
            let count = round_count(solution.value(p.count)).ok_or_else(|| {
                AssignError::InconsistentSolution(format!(
                    "non-integral count {} for '{}' / '{}'",
                    solution.value(p.count),
                    p.worker_id,
                    p.task_type
                ))
            })?;
            demand.insert(p.task_type.as_str(), p.demand);
            *assigned.entry(p.task_type.as_str()).or_insert(0) += count;
            if count > 0 {
                plan.add_row(PlanRow::new(&p.worker_id, &p.task_type, count, p.speed));
            }
        }

        for (task_type, required) in demand {
            let got = assigned.get(task_type).copied().unwrap_or(0);
            if got != required {
                return Err(AssignError::InconsistentSolution(format!(
                    "task type '{task_type}' assigned {got} tasks, demand is {required}"
                )));
            }
        }

        Ok(plan)
    }
}

/// Rounds a solver value to a task count.
///
/// Returns `None` for negative, non-finite or clearly fractional values.
fn round_count(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < 0.0 || (value - rounded).abs() > INTEGRALITY_TOLERANCE {
        return None;
    }
    Some(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BalanceBand, DemandVector, Objective, OptimizationConfig, SpeedTable};
    use crate::optimizer::AssignmentModelBuilder;

    #[test]
    fn test_round_count() {
        assert_eq!(round_count(3.0), Some(3));
        assert_eq!(round_count(2.99999999), Some(3));
        assert_eq!(round_count(-0.0000001), Some(0));
        assert_eq!(round_count(0.5), None);
        assert_eq!(round_count(-2.0), None);
        assert_eq!(round_count(f64::NAN), None);
    }

    #[test]
    fn test_solve_prefers_fast_workers_within_cap() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 1.0)
            .with_speed("Beto", "invoice", 2.0)
            .with_speed("Caro", "invoice", 3.0);
        let demand = DemandVector::new().with("invoice", 10);
        let plan = AssignmentModelBuilder::new(
            &table,
            &["Ana", "Beto", "Caro"],
            &demand,
            OptimizationConfig::default(),
        )
        .build()
        .unwrap()
        .solve()
        .unwrap();

        // Caps at 4: Ana 4, Beto 4, Caro 2
        assert_eq!(plan.task_count("Ana", "invoice"), 4);
        assert_eq!(plan.task_count("Beto", "invoice"), 4);
        assert_eq!(plan.task_count("Caro", "invoice"), 2);
        assert!((plan.total_minutes() - 18.0).abs() < 1e-6);
    }

    #[test]
    fn test_solve_makespan_even_split() {
        let table = SpeedTable::new()
            .with_speed("Ana", "invoice", 3.0)
            .with_speed("Beto", "invoice", 3.0);
        let demand = DemandVector::new().with("invoice", 10);
        let config = OptimizationConfig::default()
            .with_objective(Objective::Makespan)
            .with_balance(BalanceBand::new(0.0, 1.0));
        let plan = AssignmentModelBuilder::new(&table, &["Ana", "Beto"], &demand, config)
            .build()
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(plan.task_count("Ana", "invoice"), 5);
        assert_eq!(plan.task_count("Beto", "invoice"), 5);
        assert!((plan.makespan_minutes() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_solve_empty_demand() {
        let table = SpeedTable::new().with_speed("Ana", "invoice", 3.0);
        let demand = DemandVector::new().with("invoice", 0);
        let plan = AssignmentModelBuilder::new(&table, &["Ana"], &demand, OptimizationConfig::default())
            .build()
            .unwrap()
            .solve()
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_solver_infeasible_batches() {
        // Each task type alone passes the pre-check, but with 3 workers in
        // [1, 2] tasks each and batches of 2, the 5 tasks cannot split.
        let table = SpeedTable::new()
            .with_speed("Ana", "a", 1.0)
            .with_speed("Beto", "a", 1.0)
            .with_speed("Caro", "a", 1.0)
            .with_speed("Ana", "b", 1.0)
            .with_speed("Beto", "b", 1.0)
            .with_speed("Caro", "b", 1.0);
        let demand = DemandVector::new().with("a", 3).with("b", 2);
        let config = OptimizationConfig::default()
            .with_min_batch(2)
            .with_balance(BalanceBand::new(0.2, 0.4));
        let err = AssignmentModelBuilder::new(&table, &["Ana", "Beto", "Caro"], &demand, config)
            .build()
            .unwrap()
            .solve()
            .unwrap_err();
        assert_eq!(err.infeasible_cause(), Some(InfeasibleCause::Solver));
    }
}
