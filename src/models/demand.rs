//! Demand model.
//!
//! Required task counts per task type for a single run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AssignError, Result};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Required task count per task type.
///
/// Ordered by task type, which fixes the variable order of the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandVector {
    /// Task type → required count.
    pub counts: BTreeMap<String, u32>,
}

impl DemandVector {
    /// Creates an empty demand vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the count for a task type.
    pub fn with(mut self, task_type: impl Into<String>, count: u32) -> Self {
        self.counts.insert(task_type.into(), count);
        self
    }

    /// Parses raw (task type, text) entries.
    ///
    /// Blank text counts as zero. Text that is not a non-negative integer
    /// is reported; all bad entries are collected before failing.
    pub fn parse<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut counts = BTreeMap::new();
        let mut errors = Vec::new();

        for (task_type, raw) in entries {
            let task_type = task_type.into();
            let text = raw.as_ref().trim();
            if text.is_empty() {
                counts.insert(task_type, 0);
                continue;
            }
            match text.parse::<u32>() {
                Ok(n) => {
                    counts.insert(task_type, n);
                }
                Err(_) => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDemand,
                    format!("Demand for '{task_type}' is not a non-negative integer: '{text}'"),
                )),
            }
        }

        if errors.is_empty() {
            Ok(Self { counts })
        } else {
            Err(AssignError::Validation(errors))
        }
    }

    /// Required count for a task type (0 if absent).
    pub fn get(&self, task_type: &str) -> u32 {
        self.counts.get(task_type).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&n| u64::from(n)).sum()
    }

    /// Largest single count (0 if empty).
    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Task types in order.
    pub fn task_types(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Iterates (task type, count) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(t, &n)| (t.as_str(), n))
    }

    /// Number of task types.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no task type is listed.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for DemandVector {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
