//! MILP formulation of the quota assignment problem.
//!
//! # Variables
//!
//! - `x[a,t] ∈ ℤ, 0 <= x <= demand[t]`: tasks of type `t` given to worker `a`
//! - `y[a,t] ∈ {0,1}`: pair used (only with a minimum batch `m > 0`)
//! - `M ∈ ℝ`: largest worker load (makespan objective only)
//!
//! # Constraints
//!
//! - Demand: `Σ_a x[a,t] = demand[t]`
//! - Batch linkage: `x >= m·y`, `x <= BIG·y`, `BIG = max(max demand, m) × |workers|`
//! - Balance: `lower·T <= Σ_t x[a,t] <= upper·T`, `T = Σ demand`
//! - Makespan: `Σ_t x[a,t]·speed[a,t] <= M`
//!
//! # Reference
//! Williams (2013), "Model Building in Mathematical Programming", Ch. 9
//! (indicator variables and big-M linkage)

use std::collections::BTreeSet;

use good_lp::{variable, Constraint, Expression, ProblemVariables, Variable};
use tracing::debug;

use crate::error::{AssignError, InfeasibleCause, Result};
use crate::models::{DemandVector, Objective, OptimizationConfig, SpeedTable};

/// Decision variables of one worker × task type pair.
#[derive(Debug, Clone)]
pub struct PairVars {
    /// Worker ID.
    pub worker_id: String,
    /// Task type.
    pub task_type: String,
    /// Minutes per task.
    pub speed: f64,
    /// Required count for the task type.
    pub demand: u32,
    /// Task count variable.
    pub count: Variable,
    /// Usage indicator (minimum batch only).
    pub used: Option<Variable>,
}

/// A built model, ready for a solver.
pub struct AssignmentModel {
    pub(crate) vars: ProblemVariables,
    pub(crate) objective: Expression,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) pairs: Vec<PairVars>,
    pub(crate) makespan: Option<Variable>,
    pub(crate) big_m: Option<f64>,
}

impl AssignmentModel {
    /// Pair variables, ordered by worker then task type.
    pub fn pairs(&self) -> &[PairVars] {
        &self.pairs
    }

    /// Number of decision variables.
    pub fn variable_count(&self) -> usize {
        let indicators = self.pairs.iter().filter(|p| p.used.is_some()).count();
        self.pairs.len() + indicators + usize::from(self.makespan.is_some())
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Big-M constant used for batch linkage, if any.
    pub fn big_m(&self) -> Option<f64> {
        self.big_m
    }

    /// Whether the model carries a makespan variable.
    pub fn has_makespan(&self) -> bool {
        self.makespan.is_some()
    }
}

/// Builds an assignment model from a normalized speed table.
///
/// The table must already hold a positive speed for every selected
/// worker × demanded task type (see [`crate::normalize::normalize`]).
/// Task types with zero demand are left out of the model.
///
/// # Example
/// ```
/// use u_assign::models::{DemandVector, OptimizationConfig, SpeedTable};
/// use u_assign::optimizer::AssignmentModelBuilder;
///
/// let table = SpeedTable::new()
///     .with_speed("Ana", "invoice", 2.0)
///     .with_speed("Beto", "invoice", 3.0)
///     .with_speed("Caro", "invoice", 4.0);
/// let demand = DemandVector::new().with("invoice", 10);
/// let config = OptimizationConfig::default();
///
/// let builder = AssignmentModelBuilder::new(&table, &["Ana", "Beto", "Caro"], &demand, config);
/// let model = builder.build().unwrap();
/// assert_eq!(model.pairs().len(), 3);
/// ```
pub struct AssignmentModelBuilder<'a> {
    table: &'a SpeedTable,
    workers: Vec<String>,
    demand: &'a DemandVector,
    config: OptimizationConfig,
}

impl<'a> AssignmentModelBuilder<'a> {
    /// Creates a builder. Worker IDs are sorted and deduplicated.
    pub fn new<S: AsRef<str>>(
        table: &'a SpeedTable,
        workers: &[S],
        demand: &'a DemandVector,
        config: OptimizationConfig,
    ) -> Self {
        let workers: BTreeSet<&str> = workers.iter().map(AsRef::as_ref).collect();
        Self {
            table,
            workers: workers.into_iter().map(str::to_string).collect(),
            demand,
            config,
        }
    }

    /// Selected workers in model order.
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    /// The run configuration.
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// The demand vector.
    pub fn demand(&self) -> &DemandVector {
        self.demand
    }

    /// Big-M for batch linkage: `max(max demand, m) × |workers|`.
    pub fn big_m(&self) -> f64 {
        let m = self.config.min_batch;
        f64::from(self.demand.max_count().max(m)) * self.workers.len() as f64
    }

    /// Checks necessary feasibility conditions without a solver.
    ///
    /// - A task type with `0 < demand < m` cannot be covered by batches of `m`.
    /// - With `n` workers, `n × ceil(lower·T) <= T <= n × floor(upper·T)`.
    pub fn pre_check(&self) -> Result<()> {
        let m = self.config.min_batch;
        if m > 0 {
            if let Some((task_type, count)) =
                self.demand.iter().find(|&(_, count)| count > 0 && count < m)
            {
                return Err(AssignError::infeasible(
                    InfeasibleCause::MinimumBatch,
                    format!(
                        "task type '{task_type}' needs {count} tasks, below the minimum batch of {m}; \
                         lower the minimum batch or raise the demand"
                    ),
                ));
            }
        }

        let total = self.demand.total();
        let n = self.workers.len() as u64;
        let (lo, hi) = self.config.balance.integer_bounds(total);
        if n * hi < total {
            return Err(AssignError::infeasible(
                InfeasibleCause::BalanceBand,
                format!(
                    "{n} workers can carry at most {hi} of {total} tasks each ({:.0}% cap); \
                     select more workers",
                    self.config.balance.upper * 100.0
                ),
            ));
        }
        if n * lo > total {
            return Err(AssignError::infeasible(
                InfeasibleCause::BalanceBand,
                format!(
                    "{n} workers need at least {lo} of {total} tasks each ({:.0}% floor); \
                     select fewer workers",
                    self.config.balance.lower * 100.0
                ),
            ));
        }
        Ok(())
    }

    /// Builds the model.
    ///
    /// # Errors
    /// - `Infeasible` if [`pre_check`](Self::pre_check) fails
    /// - `Data` if a pair has no positive speed in the table
    pub fn build(&self) -> Result<AssignmentModel> {
        self.pre_check()?;

        let min_batch = self.config.min_batch;
        let big_m = (min_batch > 0).then(|| self.big_m());
        let demanded: Vec<(&str, u32)> = self.demand.iter().filter(|&(_, n)| n > 0).collect();

        let mut vars = ProblemVariables::new();
        let mut pairs = Vec::with_capacity(self.workers.len() * demanded.len());

        for worker in &self.workers {
            for &(task_type, demand) in &demanded {
                let speed = self.table.speed(worker, task_type).ok_or_else(|| {
                    AssignError::Data(format!(
                        "no positive speed for worker '{worker}' and task type '{task_type}'"
                    ))
                })?;
                let count = vars.add(
                    variable()
                        .integer()
                        .min(0.0)
                        .max(f64::from(demand))
                        .name(format!("x_{worker}_{task_type}")),
                );
                let used = big_m.map(|_| {
                    vars.add(
                        variable()
                            .binary()
                            .name(format!("y_{worker}_{task_type}")),
                    )
                });
                pairs.push(PairVars {
                    worker_id: worker.clone(),
                    task_type: task_type.to_string(),
                    speed,
                    demand,
                    count,
                    used,
                });
            }
        }

        let makespan = match self.config.objective {
            Objective::Total => None,
            Objective::Makespan => Some(vars.add(variable().name("makespan"))),
        };

        let mut constraints = Vec::new();

        // Demand satisfaction
        for &(task_type, demand) in &demanded {
            let mut sum = Expression::default();
            for p in pairs.iter().filter(|p| p.task_type == task_type) {
                sum.add_mul(1.0, p.count);
            }
            constraints.push(sum.eq(f64::from(demand)));
        }

        // Minimum batch linkage
        if let Some(big) = big_m {
            let m = f64::from(min_batch);
            for p in &pairs {
                if let Some(y) = p.used {
                    constraints.push((p.count - m * y).geq(0.0));
                    constraints.push((p.count - big * y).leq(0.0));
                }
            }
        }

        // Workload balance and makespan bound
        let (lower, upper) = self.config.balance.bounds(self.demand.total());
        let mut objective = Expression::with_capacity(pairs.len());
        for worker in &self.workers {
            let mut tasks = Expression::default();
            let mut minutes = Expression::default();
            for p in pairs.iter().filter(|p| &p.worker_id == worker) {
                tasks.add_mul(1.0, p.count);
                minutes.add_mul(p.speed, p.count);
            }
            constraints.push(tasks.clone().geq(lower));
            constraints.push(tasks.leq(upper));

            match makespan {
                Some(mk) => constraints.push((minutes - mk).leq(0.0)),
                None => objective += minutes,
            }
        }
        if let Some(mk) = makespan {
            objective = Expression::from(mk);
        }

        debug!(
            workers = self.workers.len(),
            task_types = demanded.len(),
            constraints = constraints.len(),
            objective = %self.config.objective,
            big_m,
            "built assignment model"
        );

        Ok(AssignmentModel {
            vars,
            objective,
            constraints,
            pairs,
            makespan,
            big_m,
        })
    }
}
