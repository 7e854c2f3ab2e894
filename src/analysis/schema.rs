//! Schema reconciliation between an input table and a fitted model.
//!
//! Produces one typed report of what the input offers relative to what the
//! model expects, so later stages never check column membership ad hoc.

use serde::Serialize;
use tracing::{info, warn};

use super::AnalysisOptions;
use crate::model::ModelArtifact;

/// Column availability for one analysis call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnAvailability {
    /// Model columns, fitted order
    pub expected: Vec<String>,
    /// Input columns after exclusion and renaming, input order
    pub present: Vec<String>,
    /// `(input name, canonical name)` renames
    pub renamed: Vec<(String, String)>,
    /// Excluded channels that were present in the input
    pub excluded: Vec<String>,
    /// Present but not used by the model
    pub ignored: Vec<String>,
    /// Expected but absent
    pub missing: Vec<String>,
    /// Expected and present, fitted order
    pub usable: Vec<String>,
    /// Temperature columns to summarise (model list, or derived by keyword)
    pub temperature_columns: Vec<String>,
}

impl ColumnAvailability {
    pub fn reconcile(
        input_columns: &[&str],
        artifact: &ModelArtifact,
        options: &AnalysisOptions,
    ) -> Self {
        let mut report = Self {
            expected: artifact.expected_columns().to_vec(),
            ..Self::default()
        };

        for &col in input_columns {
            if options.excluded_columns.iter().any(|e| e == col) {
                report.excluded.push(col.to_string());
            } else {
                report.present.push(col.to_string());
            }
        }

        // Legacy coolant naming: only when the canonical name is not already there
        let has_canonical = report.present.iter().any(|c| *c == options.coolant_canonical);
        if !has_canonical {
            if let Some(slot) = report
                .present
                .iter_mut()
                .find(|c| **c == options.coolant_alias)
            {
                report
                    .renamed
                    .push((slot.clone(), options.coolant_canonical.clone()));
                slot.clone_from(&options.coolant_canonical);
                info!(
                    from = %options.coolant_alias,
                    to = %options.coolant_canonical,
                    "Renamed legacy coolant column"
                );
            }
        }

        report.temperature_columns = if artifact.temperature_columns().is_empty() {
            report
                .present
                .iter()
                .filter(|c| is_temperature_column(c, &options.temperature_keywords))
                .cloned()
                .collect()
        } else {
            artifact.temperature_columns().to_vec()
        };

        for expected in artifact.expected_columns() {
            if report.present.contains(expected) {
                report.usable.push(expected.clone());
            } else {
                report.missing.push(expected.clone());
            }
        }
        report.ignored = report
            .present
            .iter()
            .filter(|c| !report.expected.contains(c))
            .cloned()
            .collect();

        if !report.missing.is_empty() {
            warn!(
                missing = ?report.missing,
                "Input lacks expected model columns, analysing a reduced feature set"
            );
        }
        if !report.ignored.is_empty() {
            info!(ignored = ?report.ignored, "Ignoring columns the model was not trained on");
        }

        report
    }

    /// Input column holding the data for a canonical (model) column name.
    pub fn source_column<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.renamed
            .iter()
            .find(|(_, to)| to == canonical)
            .map_or(canonical, |(from, _)| from.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Case-insensitive keyword match on a column name.
pub fn is_temperature_column(name: &str, keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}
