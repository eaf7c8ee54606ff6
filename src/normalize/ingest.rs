//! Raw row ingestion.
//!
//! Turns pre-split text records into a [`SpeedTable`]. Column names are
//! matched case- and whitespace-insensitively; speeds accept `.` or `,`
//! as the decimal separator.

use tracing::{debug, info};

use crate::error::{AssignError, Result};
use crate::models::{SpeedRecord, SpeedTable};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Worker column name.
pub const WORKER_COLUMN: &str = "auditor";
/// Task type column name.
pub const TASK_TYPE_COLUMN: &str = "task_type";
/// Speed column name.
pub const SPEED_COLUMN: &str = "avg_speed";

/// Minutes in a day.
pub const DAY_MINUTES: f64 = 1440.0;

/// Positions of the required columns in a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub worker: usize,
    pub task_type: usize,
    pub speed: usize,
}

impl ColumnIndex {
    /// Locates the required columns.
    ///
    /// Reports every missing column at once.
    pub fn resolve<H: AsRef<str>>(headers: &[H]) -> std::result::Result<Self, Vec<ValidationError>> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);

        let worker = find(WORKER_COLUMN);
        let task_type = find(TASK_TYPE_COLUMN);
        let speed = find(SPEED_COLUMN);

        match (worker, task_type, speed) {
            (Some(worker), Some(task_type), Some(speed)) => Ok(Self {
                worker,
                task_type,
                speed,
            }),
            _ => Err([
                (worker, WORKER_COLUMN),
                (task_type, TASK_TYPE_COLUMN),
                (speed, SPEED_COLUMN),
            ]
            .into_iter()
            .filter(|(pos, _)| pos.is_none())
            .map(|(_, name)| {
                ValidationError::new(
                    ValidationErrorKind::MissingColumn,
                    format!("Missing required column '{name}'"),
                )
            })
            .collect()),
        }
    }
}

/// Parses a speed cell.
///
/// Blank, `nan`, `na` and `null` cells are missing values (`Ok(None)`).
/// A comma is read as the decimal separator.
pub fn parse_decimal(text: &str) -> std::result::Result<Option<f64>, String> {
    let text = text.trim();
    if text.is_empty() || matches!(text.to_ascii_lowercase().as_str(), "nan" | "na" | "null") {
        return Ok(None);
    }
    text.replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("'{text}' is not a number"))
}

/// Rescales day-based speeds to minutes.
///
/// If the median speed is below 1, every present value is multiplied by
/// [`DAY_MINUTES`]. Returns whether the table was rescaled.
pub fn rescale_units(table: &mut SpeedTable) -> bool {
    match table.median_speed() {
        Some(median) if median < 1.0 => {
            for record in &mut table.records {
                if let Some(speed) = record.speed.as_mut() {
                    *speed *= DAY_MINUTES;
                }
            }
            info!(median, "speeds look like days per task, rescaled to minutes");
            true
        }
        _ => false,
    }
}

/// Builds a speed table from a header row and data rows.
///
/// Unit rescaling is applied. Unparseable speeds, short rows and blank
/// worker or task-type cells are collected and reported together.
///
/// # Example
/// ```
/// use u_assign::normalize::ingest;
///
/// let headers = [" Auditor ", "TASK_TYPE", "avg_speed"];
/// let rows = vec![
///     vec!["Ana", "invoice", "2,5"],
///     vec!["Beto", "invoice", "4"],
/// ];
/// let table = ingest(&headers, &rows).unwrap();
/// assert_eq!(table.speed("Ana", "invoice"), Some(2.5));
/// ```
pub fn ingest<H, R, F>(headers: &[H], rows: &[R]) -> Result<SpeedTable>
where
    H: AsRef<str>,
    R: AsRef<[F]>,
    F: AsRef<str>,
{
    let columns = ColumnIndex::resolve(headers).map_err(AssignError::Validation)?;
    let mut table = SpeedTable::new();
    let mut errors = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let cells = row.as_ref();
        let line = i + 1;
        let cell = |pos: usize| cells.get(pos).map(|c| c.as_ref().trim());

        let (Some(worker), Some(task_type)) = (cell(columns.worker), cell(columns.task_type))
        else {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingColumn,
                format!("Row {line} has {} cells, missing worker or task type", cells.len()),
            ));
            continue;
        };
        if worker.is_empty() || task_type.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingColumn,
                format!("Row {line} has a blank worker or task type"),
            ));
            continue;
        }

        match parse_decimal(cell(columns.speed).unwrap_or("")) {
            Ok(speed) => table.records.push(SpeedRecord {
                worker_id: worker.to_string(),
                task_type: task_type.to_string(),
                speed,
                imputed: false,
            }),
            Err(msg) => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSpeed,
                format!("Row {line}: {msg}"),
            )),
        }
    }

    if !errors.is_empty() {
        return Err(AssignError::Validation(errors));
    }

    rescale_units(&mut table);
    debug!(rows = table.len(), "ingested speed rows");
    Ok(table)
}
