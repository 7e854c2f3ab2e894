//! Result record types: AnalysisRecord, AnalysisReport, AnomalySummary, etc.
//!
//! Every map is a `BTreeMap` so two runs over the same input serialize to
//! identical bytes (apart from `timestamp`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Training-time normal range for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBounds {
    pub min_normal: f64,
    pub max_normal: f64,
}

impl ColumnBounds {
    /// Bounds that never flag anything.
    pub const UNBOUNDED: Self = Self {
        min_normal: f64::NEG_INFINITY,
        max_normal: f64::INFINITY,
    };

    pub fn is_out_of_range(&self, value: f64) -> bool {
        value < self.min_normal || value > self.max_normal
    }
}

/// Outcome of one analysis call. Serializes with a `status` tag of
/// `"success"` or `"error"`; the error variant carries only `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisRecord {
    Success(Box<AnalysisReport>),
    Error { message: String },
}

impl AnalysisRecord {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error { message } => Some(message),
        }
    }
}

/// Successful analysis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Local generation time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub anomaly_summary: AnomalySummary,
    pub temperature_analysis: BTreeMap<String, TemperatureStats>,
    pub plot_data: PlotData,
    /// Decimated temperature traces, index-aligned with `plot_data`
    pub temperature_series: BTreeMap<String, Vec<f64>>,
    /// Bounds echoed from the model artifact
    pub column_stats: BTreeMap<String, ColumnBounds>,
    /// First anomalous rows (prepared feature values)
    pub sample_anomalies: Vec<BTreeMap<String, f64>>,
    pub data_quality: DataQualityNotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub total_records: usize,
    pub anomaly_count: usize,
    /// Always within [0, 100]; 0 when `total_records` is 0
    pub anomaly_percentage: f64,
    /// Column -> number of rows outside the column's normal range
    pub parameter_anomalies: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Value at the final full-resolution row
    pub last: f64,
    pub anomalies: usize,
}

/// A point on the plot x-axis: either the input's time label or a row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeLabel {
    Index(usize),
    Number(f64),
    Text(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub time: Vec<TimeLabel>,
    pub errors: Vec<f64>,
    pub threshold: f64,
    /// Anomaly positions in the (possibly decimated) plotted series
    pub anomaly_indices: Vec<usize>,
    pub downsampled: bool,
    pub original_length: usize,
}

/// Degraded-input notes, so callers can tell a full-confidence analysis from
/// one that ran on a reduced or repaired feature set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityNotes {
    /// Excluded channels that were present and dropped
    pub columns_excluded: Vec<String>,
    /// `(from, to)` renames applied
    pub columns_renamed: Vec<(String, String)>,
    /// Expected by the model but absent from the input
    pub columns_missing: Vec<String>,
    /// Present in the input but unknown to the model
    pub columns_ignored: Vec<String>,
    /// Present but with no usable numeric value at all
    pub columns_fully_missing: Vec<String>,
    /// Cells that failed numeric coercion
    pub values_coerced: usize,
    /// Cells filled by forward/backward fill
    pub values_filled: usize,
    /// Temperature columns named by the model but not available
    pub temperature_columns_missing: Vec<String>,
    pub reduced_confidence: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_has_only_status_and_message() {
        let record = AnalysisRecord::error("Failed to load model: missing");
        let json = serde_json::to_value(&record).expect("serialize");
        let obj = json.as_object().expect("object");

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["status"], "error");
        assert_eq!(obj["message"], "Failed to load model: missing");
    }

    #[test]
    fn test_time_labels_serialize_flat() {
        let labels = vec![
            TimeLabel::Index(3),
            TimeLabel::Text("00:00:10".to_string()),
            TimeLabel::Missing,
        ];
        let json = serde_json::to_string(&labels).expect("serialize");
        assert_eq!(json, r#"[3,"00:00:10",null]"#);
    }

    #[test]
    fn test_unbounded_never_flags() {
        assert!(!ColumnBounds::UNBOUNDED.is_out_of_range(1e300));
        let b = ColumnBounds {
            min_normal: 0.0,
            max_normal: 1.0,
        };
        assert!(b.is_out_of_range(-0.1));
        assert!(b.is_out_of_range(1.1));
        assert!(!b.is_out_of_range(1.0));
    }
}
