//! Feature Preparer
//!
//! Turns a raw table into the numeric feature matrix the model expects:
//! 1. Reconcile the schema (exclusions, coolant rename, intersection)
//! 2. Coerce every usable column to numbers (failures become gaps)
//! 3. Forward-fill, then backward-fill gaps
//! 4. Drop columns with no numeric value at all
//!
//! Missing model columns and fully-missing columns shrink the feature set;
//! they are recorded in the data-quality notes, never treated as errors here.

use tracing::{debug, warn};

use super::{AnalysisError, AnalysisOptions, ColumnAvailability};
use crate::model::ModelArtifact;
use crate::types::{CellValue, DataQualityNotes, FeatureMatrix, RawTable, TimeLabel};

/// Output of feature preparation.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub matrix: FeatureMatrix,
    /// Temperature columns present in `matrix`
    pub temperature_columns: Vec<String>,
    /// Raw time labels, one per row, when the input had a time column
    pub time_labels: Option<Vec<TimeLabel>>,
    pub availability: ColumnAvailability,
    pub notes: DataQualityNotes,
}

/// Feature preparation stage
pub struct FeaturePreparer;

impl FeaturePreparer {
    /// Build the feature matrix for `table`.
    ///
    /// # Errors
    /// `AnalysisError::Data` if the table has no rows, or if no model column
    /// survives preparation.
    pub fn prepare(
        table: &RawTable,
        artifact: &ModelArtifact,
        options: &AnalysisOptions,
    ) -> Result<PreparedData, AnalysisError> {
        if table.is_empty() {
            return Err(AnalysisError::Data("input table is empty".to_string()));
        }

        let availability = ColumnAvailability::reconcile(&table.column_names(), artifact, options);

        let mut notes = DataQualityNotes {
            columns_excluded: availability.excluded.clone(),
            columns_renamed: availability.renamed.clone(),
            columns_missing: availability.missing.clone(),
            columns_ignored: availability.ignored.clone(),
            ..DataQualityNotes::default()
        };

        let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(availability.usable.len());
        for name in &availability.usable {
            let Some(raw) = table.column(availability.source_column(name)) else {
                continue;
            };

            let (mut values, coerced) = coerce_column(&raw.values);
            notes.values_coerced += coerced;
            if coerced > 0 {
                warn!(column = %name, count = coerced, "Non-numeric values coerced to missing");
            }

            notes.values_filled += fill_gaps(&mut values);

            // Only an all-missing column is left with gaps after filling
            match values.into_iter().collect::<Option<Vec<f64>>>() {
                Some(filled) => columns.push((name.clone(), filled)),
                None => {
                    warn!(column = %name, "Column has no numeric values, excluding from features");
                    notes.columns_fully_missing.push(name.clone());
                }
            }
        }

        if columns.is_empty() {
            return Err(AnalysisError::Data(format!(
                "no usable feature columns (model expects: {})",
                artifact.expected_columns().join(", ")
            )));
        }

        let matrix = FeatureMatrix::from_columns(columns).ok_or_else(|| {
            AnalysisError::Data("prepared columns have unequal lengths".to_string())
        })?;

        let temperature_columns: Vec<String> = availability
            .temperature_columns
            .iter()
            .filter(|c| matrix.column_index(c).is_some())
            .cloned()
            .collect();
        // Keyword-derived columns are present by construction
        notes.temperature_columns_missing = artifact
            .temperature_columns()
            .iter()
            .filter(|c| !temperature_columns.contains(c))
            .cloned()
            .collect();

        notes.reduced_confidence = !availability.is_complete()
            || !notes.columns_fully_missing.is_empty()
            || notes.values_coerced > 0
            || notes.values_filled > 0;

        let time_labels = table
            .column(&options.time_column)
            .map(|c| c.values.iter().map(time_label).collect::<Vec<_>>())
            .filter(|labels| !labels.is_empty());

        debug!(
            rows = matrix.rows(),
            features = matrix.width(),
            expected = artifact.expected_columns().len(),
            filled = notes.values_filled,
            "Prepared feature matrix"
        );

        Ok(PreparedData {
            matrix,
            temperature_columns,
            time_labels,
            availability,
            notes,
        })
    }
}

/// Coerce raw cells to finite numbers. Returns the values and the number of
/// present-but-unparseable cells.
fn coerce_column(values: &[CellValue]) -> (Vec<Option<f64>>, usize) {
    let mut coerced = 0;
    let out = values
        .iter()
        .map(|cell| {
            let v = cell.to_finite();
            if v.is_none() && !cell.is_missing() {
                coerced += 1;
            }
            v
        })
        .collect();
    (out, coerced)
}

/// Forward-fill then backward-fill gaps in place. Returns how many cells
/// were filled. A column with no values at all is left untouched.
pub fn fill_gaps(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;

    let mut last = None;
    for v in values.iter_mut() {
        if v.is_some() {
            last = *v;
        } else if last.is_some() {
            *v = last;
            filled += 1;
        }
    }

    let mut next = None;
    for v in values.iter_mut().rev() {
        if v.is_some() {
            next = *v;
        } else if next.is_some() {
            *v = next;
            filled += 1;
        }
    }

    filled
}

fn time_label(cell: &CellValue) -> TimeLabel {
    match cell {
        CellValue::Number(v) if v.is_finite() => TimeLabel::Number(*v),
        CellValue::Number(_) | CellValue::Missing => TimeLabel::Missing,
        CellValue::Text(s) => TimeLabel::Text(s.clone()),
    }
}
