//! Run configuration.
//!
//! Policy constants (imputation penalty, speed floor, balance band) live
//! here so they can be tuned without touching the model builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optimization objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Minimize aggregate person-minutes.
    #[default]
    Total,
    /// Minimize the largest per-worker time.
    Makespan,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::Makespan => write!(f, "makespan"),
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Self::Total),
            "makespan" => Ok(Self::Makespan),
            other => Err(format!("Unknown objective '{other}' (expected 'total' or 'makespan')")),
        }
    }
}

/// Share of total demand every worker must carry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceBand {
    /// Minimum share (0.0..=1.0).
    pub lower: f64,
    /// Maximum share (0.0..=1.0).
    pub upper: f64,
}

impl Default for BalanceBand {
    fn default() -> Self {
        Self {
            lower: 0.05,
            upper: 0.40,
        }
    }
}

impl BalanceBand {
    /// Creates a band.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Whether `0 <= lower <= upper <= 1`.
    pub fn is_valid(&self) -> bool {
        self.lower.is_finite()
            && self.upper.is_finite()
            && 0.0 <= self.lower
            && self.lower <= self.upper
            && self.upper <= 1.0
    }

    /// Real-valued bounds on one worker's task total.
    pub fn bounds(&self, total_demand: u64) -> (f64, f64) {
        let total = total_demand as f64;
        (self.lower * total, self.upper * total)
    }

    /// Integer bounds on one worker's task total.
    ///
    /// `(ceil(lower·T), floor(upper·T))`, tolerant to float noise.
    pub fn integer_bounds(&self, total_demand: u64) -> (u64, u64) {
        const EPS: f64 = 1e-9;
        let (lo, hi) = self.bounds(total_demand);
        let lo = (lo - EPS).ceil().max(0.0) as u64;
        let hi = (hi + EPS).floor().max(0.0) as u64;
        (lo, hi)
    }
}

/// Speed table normalization policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Multiplier applied to fallback speeds (imputed workers look slower).
    pub penalty: f64,
    /// Minimum minutes per task after normalization.
    pub min_speed: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            penalty: 1.2,
            min_speed: 0.5,
        }
    }
}

impl NormalizerConfig {
    /// Sets the imputation penalty.
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Sets the speed floor.
    pub fn with_min_speed(mut self, min_speed: f64) -> Self {
        self.min_speed = min_speed;
        self
    }
}

/// Per-run optimizer configuration.
///
/// # Example
/// ```
/// use u_assign::models::{Objective, OptimizationConfig};
///
/// let config = OptimizationConfig::new()
///     .with_objective(Objective::Makespan)
///     .with_min_batch(5);
/// assert_eq!(config.min_batch, 5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Objective to minimize.
    pub objective: Objective,
    /// Smallest non-zero count per (worker, task type). 0 disables it.
    pub min_batch: u32,
    /// Per-worker workload band.
    pub balance: BalanceBand,
    /// Normalization policy.
    pub normalizer: NormalizerConfig,
}

impl OptimizationConfig {
    /// Creates the default configuration (total time, no minimum batch).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the minimum batch size.
    pub fn with_min_batch(mut self, min_batch: u32) -> Self {
        self.min_batch = min_batch;
        self
    }

    /// Sets the balance band.
    pub fn with_balance(mut self, balance: BalanceBand) -> Self {
        self.balance = balance;
        self
    }

    /// Sets the normalization policy.
    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }
}
