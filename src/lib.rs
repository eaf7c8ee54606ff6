//! Workload quota assignment for the U-Engine ecosystem.
//!
//! Splits per-task-type demand across a pool of workers using measured
//! per-worker speeds. Minimizes either aggregate processing time or the
//! busiest worker's load, subject to exact demand, a per-worker workload
//! band and an optional minimum batch per worker × task type.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `SpeedTable`, `DemandVector`,
//!   `AssignmentPlan`, `WorkerSummary`, `OptimizationConfig`
//! - **`normalize`**: Speed table ingestion, unit rescaling and imputation
//! - **`optimizer`**: MILP construction (`good_lp`), solving, decoding, KPIs
//! - **`validation`**: Request integrity checks (selection, demand, config)
//! - **`error`**: `AssignError` taxonomy
//!
//! # Solver Backends
//!
//! The MILP is solved through `good_lp`'s default solver. The pure-Rust
//! `microlp` backend is enabled by default; `coin_cbc` and `highs` are
//! available as cargo features.
//!
//! # References
//!
//! - Pentico (2007), "Assignment problems: A golden anniversary survey"
//! - Williams (2013), "Model Building in Mathematical Programming"

pub mod error;
pub mod models;
pub mod normalize;
pub mod optimizer;
pub mod validation;

pub use error::{AssignError, InfeasibleCause, Result};
pub use optimizer::{solve, AssignmentRequest, Solution};
