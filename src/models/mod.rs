//! Assignment domain models.
//!
//! Provides the data types for quota assignment problems and their
//! solutions: speed observations, demand, plans, summaries and run
//! configuration.
//!
//! # Domain Mappings
//!
//! | u-assign | Audit Office | Call Center | Warehouse |
//! |----------|--------------|-------------|-----------|
//! | Worker | Auditor | Agent | Picker |
//! | Task type | Document class | Ticket category | Order profile |
//! | Speed | Minutes per audit | Handle time | Minutes per pick list |
//! | Plan | Audit quota sheet | Queue allocation | Shift allocation |

mod config;
mod demand;
mod plan;
mod speed;

pub use config::{BalanceBand, NormalizerConfig, Objective, OptimizationConfig};
pub use demand::DemandVector;
pub use plan::{format_hh_mm, AssignmentPlan, PlanRow, SummaryRow, WorkerSummary};
pub use speed::{SpeedRecord, SpeedTable};
