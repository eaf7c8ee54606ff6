//! Missing-speed imputation.
//!
//! # Algorithm
//!
//! 1. `global_min` = smallest positive speed in the table.
//! 2. Per task type, `fallback = (type_min or global_min) × penalty`.
//! 3. Every (worker, task type) pair without a positive speed gets the
//!    fallback; absent pairs are inserted.
//! 4. Every speed is raised to at least the configured floor.
//!
//! The penalty models imputed workers as slower than the best observed
//! worker, so the solver leans on real observations first.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{AssignError, Result};
use crate::models::{NormalizerConfig, SpeedRecord, SpeedTable};

/// Completes a speed table.
///
/// Returns one record per worker × task type pair, sorted by worker then
/// task type. When a pair has several records the first positive one is
/// kept.
///
/// # Errors
/// `AssignError::Data` if no record carries a positive speed.
pub fn fill_missing(table: &SpeedTable, penalty: f64) -> Result<SpeedTable> {
    let global_min = table.min_positive_speed().ok_or_else(|| {
        AssignError::Data("no positive speed observation to derive a fallback from".into())
    })?;

    let workers = table.workers();
    let task_types = table.task_types();

    let fallbacks: BTreeMap<&str, f64> = task_types
        .iter()
        .map(|&t| {
            let base = table.min_positive_speed_for(t).unwrap_or(global_min);
            (t, base * penalty)
        })
        .collect();

    // First positive observation per pair
    let mut observed: BTreeMap<(&str, &str), &SpeedRecord> = BTreeMap::new();
    for r in &table.records {
        if r.is_valid() {
            observed
                .entry((r.worker_id.as_str(), r.task_type.as_str()))
                .or_insert(r);
        }
    }

    let mut records = Vec::with_capacity(workers.len() * task_types.len());
    for &worker in &workers {
        for (&task_type, &fallback) in &fallbacks {
            match observed.get(&(worker, task_type)) {
                Some(&record) => records.push(record.clone()),
                None => records.push(SpeedRecord::imputed(worker, task_type, fallback)),
            }
        }
    }

    let filled = SpeedTable::from_records(records);
    debug!(
        workers = workers.len(),
        task_types = task_types.len(),
        imputed = filled.imputed_count(),
        global_min,
        "filled missing speeds"
    );
    Ok(filled)
}

/// Raises every speed to at least `min_speed`.
pub fn clamp_speeds(table: &mut SpeedTable, min_speed: f64) {
    for record in &mut table.records {
        if let Some(speed) = record.speed.as_mut() {
            *speed = speed.max(min_speed);
        }
    }
}

/// Completes and clamps a speed table.
///
/// The input is not modified; concurrent runs may share it.
///
/// # Example
/// ```
/// use u_assign::models::{NormalizerConfig, SpeedTable};
/// use u_assign::normalize::normalize;
///
/// let raw = SpeedTable::new()
///     .with_speed("Ana", "invoice", 2.0)
///     .with_speed("Beto", "receipt", 0.1);
/// let table = normalize(&raw, &NormalizerConfig::default()).unwrap();
///
/// assert_eq!(table.len(), 4);
/// assert_eq!(table.speed("Beto", "receipt"), Some(0.5));
/// assert!((table.speed("Beto", "invoice").unwrap() - 2.4).abs() < 1e-10);
/// ```
pub fn normalize(table: &SpeedTable, config: &NormalizerConfig) -> Result<SpeedTable> {
    let mut filled = fill_missing(table, config.penalty)?;
    clamp_speeds(&mut filled, config.min_speed);
    Ok(filled)
}
