//! Error taxonomy for normalization and assignment runs.

use std::fmt;

use thiserror::Error;

use crate::validation::ValidationError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AssignError>;

/// Errors raised by a normalization or assignment run.
///
/// None of these are retried. The caller adjusts its inputs (select more
/// workers, relax the minimum batch, change demand) and resubmits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignError {
    /// The speed table holds no positive observation to impute from.
    #[error("Data error: {0}")]
    Data(String),

    /// The constraint system has no feasible optimal point.
    #[error("Infeasible ({cause}): {detail}")]
    Infeasible {
        cause: InfeasibleCause,
        detail: String,
    },

    /// Inputs were rejected before model construction.
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Solver values do not reproduce the demand after rounding.
    #[error("Inconsistent solution: {0}")]
    InconsistentSolution(String),
}

/// Likely reason a run is infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibleCause {
    /// A demanded count is positive but below the minimum batch size.
    MinimumBatch,
    /// The worker count cannot fit the per-worker balance band.
    BalanceBand,
    /// The solver reported a non-optimal status.
    Solver,
}

impl fmt::Display for InfeasibleCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumBatch => write!(f, "minimum batch"),
            Self::BalanceBand => write!(f, "balance band"),
            Self::Solver => write!(f, "solver"),
        }
    }
}

impl AssignError {
    pub(crate) fn infeasible(cause: InfeasibleCause, detail: impl Into<String>) -> Self {
        Self::Infeasible {
            cause,
            detail: detail.into(),
        }
    }

    /// The infeasibility cause, if this is an infeasible error.
    pub fn infeasible_cause(&self) -> Option<InfeasibleCause> {
        match self {
            Self::Infeasible { cause, .. } => Some(*cause),
            _ => None,
        }
    }

    /// The validation issues, if this is a validation error.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl From<Vec<ValidationError>> for AssignError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
