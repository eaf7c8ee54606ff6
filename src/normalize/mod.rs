//! Speed table ingestion and normalization.
//!
//! Converts raw per-(worker, task type) observations into a complete,
//! clean speed table the optimizer can consume.
//!
//! # Pipeline
//!
//! 1. [`ingest`]: resolve columns, parse decimals, rescale day-based units.
//! 2. [`fill_missing`]: impute absent and non-positive speeds with a
//!    penalized per-task-type (or global) minimum.
//! 3. [`clamp_speeds`]: floor every speed at the configured minimum.
//!
//! [`normalize`] runs steps 2 and 3 on a borrowed table and returns a new
//! one. Every step is deterministic.

mod impute;
mod ingest;

pub use impute::{clamp_speeds, fill_missing, normalize};
pub use ingest::{
    ingest, parse_decimal, rescale_units, ColumnIndex, DAY_MINUTES, SPEED_COLUMN,
    TASK_TYPE_COLUMN, WORKER_COLUMN,
};
