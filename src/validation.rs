//! Input validation for assignment runs.
//!
//! Checks the request before any model is built. Detects:
//! - Empty or duplicated worker selections
//! - Selected workers absent from the speed table
//! - Demanded task types with no speed data at all
//! - Out-of-range configuration values
//!
//! All issues are collected so the caller can fix them in one pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{DemandVector, OptimizationConfig, SpeedTable};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// No worker was selected.
    EmptySelection,
    /// A worker was selected twice.
    DuplicateId,
    /// A selected worker has no rows in the speed table.
    UnknownWorker,
    /// A task type with positive demand has no rows in the speed table.
    UnknownTaskType,
    /// A demand entry is not a non-negative integer.
    InvalidDemand,
    /// A speed cell could not be parsed as a number.
    InvalidSpeed,
    /// A required input column is missing.
    MissingColumn,
    /// A configuration value is out of range.
    InvalidConfig,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an assignment request.
///
/// Checks:
/// 1. At least one worker is selected
/// 2. No worker is selected twice
/// 3. Every selected worker appears in the speed table
/// 4. Every task type with positive demand has rows for a selected worker
/// 5. The balance band satisfies `0 <= lower <= upper <= 1`
/// 6. The imputation penalty and speed floor are finite and positive
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_request<S: AsRef<str>>(
    table: &SpeedTable,
    selected: &[S],
    demand: &DemandVector,
    config: &OptimizationConfig,
) -> ValidationResult {
    let mut errors = Vec::new();

    if selected.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptySelection,
            "Select at least one worker",
        ));
    }

    let known_workers = table.workers();
    let mut seen = BTreeSet::new();
    for worker in selected {
        let worker = worker.as_ref();
        if !seen.insert(worker) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Worker '{worker}' selected more than once"),
            ));
            continue;
        }
        if !known_workers.contains(worker) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownWorker,
                format!("Worker '{worker}' has no speed records"),
            ));
        }
    }

    // Rows of unselected workers never reach the model.
    let known_types: BTreeSet<&str> = table
        .records
        .iter()
        .filter(|r| seen.contains(r.worker_id.as_str()))
        .map(|r| r.task_type.as_str())
        .collect();
    for (task_type, count) in demand.iter() {
        if count > 0 && !known_types.contains(task_type) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTaskType,
                format!(
                    "Task type '{task_type}' has demand {count} but no speed records \
                     for the selected workers"
                ),
            ));
        }
    }

    if !config.balance.is_valid() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConfig,
            format!(
                "Balance band [{}, {}] must satisfy 0 <= lower <= upper <= 1",
                config.balance.lower, config.balance.upper
            ),
        ));
    }

    let penalty = config.normalizer.penalty;
    if !(penalty.is_finite() && penalty > 0.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConfig,
            format!("Imputation penalty must be positive, got {penalty}"),
        ));
    }

    let floor = config.normalizer.min_speed;
    if !(floor.is_finite() && floor > 0.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConfig,
            format!("Speed floor must be positive, got {floor}"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
