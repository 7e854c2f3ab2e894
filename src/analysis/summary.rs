//! Summary Builder
//!
//! Aggregates full-resolution scorer output. Nothing here looks at the
//! decimated series: `last` is the final row of the feature matrix, and
//! out-of-range counts use every row.

use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::model::ModelArtifact;
use crate::types::{AnomalySummary, FeatureMatrix, TemperatureStats};

/// Percentage of anomalous rows; 0 for an empty input.
pub fn anomaly_percentage(anomaly_count: usize, total_records: usize) -> f64 {
    if total_records == 0 {
        return 0.0;
    }
    let pct = anomaly_count as f64 / total_records as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

pub fn anomaly_summary(
    total_records: usize,
    anomaly_count: usize,
    parameter_anomalies: BTreeMap<String, usize>,
) -> AnomalySummary {
    AnomalySummary {
        total_records,
        anomaly_count,
        anomaly_percentage: anomaly_percentage(anomaly_count, total_records),
        parameter_anomalies,
    }
}

/// Per-column statistics for every temperature column present in `matrix`.
/// Columns without bounds in the artifact are never counted as anomalous.
pub fn temperature_stats(
    matrix: &FeatureMatrix,
    temperature_columns: &[String],
    artifact: &ModelArtifact,
) -> BTreeMap<String, TemperatureStats> {
    temperature_columns
        .iter()
        .filter_map(|name| {
            let values = matrix.column(name)?;
            let last = *values.last()?;
            let bounds = artifact.bounds_for(name);
            let stats = TemperatureStats {
                mean: Statistics::mean(values.iter()),
                max: Statistics::max(values.iter()),
                min: Statistics::min(values.iter()),
                last,
                anomalies: values.iter().filter(|&&v| bounds.is_out_of_range(v)).count(),
            };
            Some((name.clone(), stats))
        })
        .collect()
}

/// Up to `limit` anomalous rows, as column -> prepared value.
pub fn sample_anomalies(
    matrix: &FeatureMatrix,
    anomaly_indices: &[usize],
    limit: usize,
) -> Vec<BTreeMap<String, f64>> {
    anomaly_indices
        .iter()
        .filter(|&&i| i < matrix.rows())
        .take(limit)
        .map(|&i| {
            matrix
                .columns()
                .iter()
                .cloned()
                .zip(matrix.row(i).iter().copied())
                .collect()
        })
        .collect()
}
