//! Motor Analyzer & Result Assembler
//!
//! Orchestrates one batch analysis:
//! 1. Load the model artifact (when given a path)
//! 2. Resolve the input table
//! 3. Prepare features
//! 4. Score rows
//! 5. Summarize at full resolution, decimate plotted series
//! 6. Assemble an `AnalysisRecord`
//!
//! Every failure is converted to `AnalysisRecord::Error`; nothing here panics
//! or returns `Err` to the caller.

use std::path::Path;
use tracing::{debug, info, warn};

use super::{
    summary, AnalysisError, AnalysisOptions, AnomalyScorer, DecimationPlan, FeaturePreparer,
    InputSource, PreparedData, ScoreOutput,
};
use crate::model::ModelArtifact;
use crate::types::{AnalysisRecord, AnalysisReport, PlotData, RawTable, TimeLabel};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Batch anomaly analysis entry point
pub struct MotorAnalyzer;

impl MotorAnalyzer {
    /// Load the artifact at `model_path`, then analyse `input`.
    pub fn analyze_with_model_path(
        model_path: &Path,
        input: InputSource,
        options: &AnalysisOptions,
    ) -> AnalysisRecord {
        let artifact = match ModelArtifact::load(model_path) {
            Ok(artifact) => artifact,
            Err(e) => {
                let err = AnalysisError::ModelLoad(e);
                warn!(error = %err, "Analysis aborted");
                return AnalysisRecord::error(err.to_string());
            }
        };
        Self::analyze(&artifact, input, options)
    }

    /// Analyse `input` with an already-loaded artifact.
    pub fn analyze(
        artifact: &ModelArtifact,
        input: InputSource,
        options: &AnalysisOptions,
    ) -> AnalysisRecord {
        let result = input
            .load(options)
            .and_then(|table| Self::analyze_table(artifact, &table, options));

        match result {
            Ok(report) => AnalysisRecord::Success(Box::new(report)),
            Err(e) => {
                warn!(error = %e, "Analysis aborted");
                AnalysisRecord::error(e.to_string())
            }
        }
    }

    /// Run the pipeline on an in-memory table.
    ///
    /// # Errors
    /// `Data` when preparation leaves nothing to score, `Scoring` on a shape
    /// or numeric failure inside the model.
    pub fn analyze_table(
        artifact: &ModelArtifact,
        table: &RawTable,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, AnalysisError> {
        let prepared = FeaturePreparer::prepare(table, artifact, options)?;
        let scores = AnomalyScorer::score(&prepared.matrix, artifact)?;
        let report = Self::assemble(artifact, prepared, &scores, options);

        info!(
            rows = report.anomaly_summary.total_records,
            anomalies = report.anomaly_summary.anomaly_count,
            percentage = format_args!("{:.2}", report.anomaly_summary.anomaly_percentage),
            downsampled = report.plot_data.downsampled,
            reduced_confidence = report.data_quality.reduced_confidence,
            "Motor analysis complete"
        );

        Ok(report)
    }

    fn assemble(
        artifact: &ModelArtifact,
        prepared: PreparedData,
        scores: &ScoreOutput,
        options: &AnalysisOptions,
    ) -> AnalysisReport {
        let PreparedData {
            matrix,
            temperature_columns,
            time_labels,
            notes,
            ..
        } = prepared;

        let total = matrix.rows();
        let anomaly_indices = scores.anomaly_indices();

        let anomaly_summary = summary::anomaly_summary(
            total,
            scores.anomaly_count(),
            scores.parameter_anomalies.clone(),
        );
        let temperature_analysis =
            summary::temperature_stats(&matrix, &temperature_columns, artifact);
        let sample_anomalies =
            summary::sample_anomalies(&matrix, &anomaly_indices, options.sample_anomaly_limit);

        let plan = DecimationPlan::new(total, options.max_data_points);
        debug!(
            rows = total,
            max_points = options.max_data_points,
            stride = plan.stride(),
            points = plan.output_length(),
            downsampled = plan.is_downsampled(),
            "Decimation plan"
        );
        let time = match time_labels {
            Some(labels) => plan.apply(&labels),
            None => plan
                .sampled_indices()
                .into_iter()
                .map(TimeLabel::Index)
                .collect(),
        };
        let plot_data = PlotData {
            time,
            errors: plan.apply(&scores.errors),
            threshold: artifact.error_threshold(),
            anomaly_indices: plan.remap_indices(&anomaly_indices),
            downsampled: plan.is_downsampled(),
            original_length: plan.original_length(),
        };

        let temperature_series = temperature_columns
            .iter()
            .filter_map(|name| {
                let values = matrix.column(name)?;
                Some((name.clone(), plan.apply(&values)))
            })
            .collect();

        AnalysisReport {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            anomaly_summary,
            temperature_analysis,
            plot_data,
            temperature_series,
            column_stats: artifact.column_stats().clone(),
            sample_anomalies,
            data_quality: notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ArtifactBundle, DenseLayer, MlpAutoencoder, ModelError, Reconstructor, ScalerParams,
        StandardScaler,
    };
    use crate::types::{CellValue, ColumnBounds, FeatureMatrix};
    use std::collections::BTreeMap;

    fn zero_bundle(columns: &[&str], threshold: f64) -> ArtifactBundle {
        let n = columns.len();
        ArtifactBundle {
            format_version: crate::model::ARTIFACT_FORMAT_VERSION,
            reconstructor: MlpAutoencoder {
                layers: vec![DenseLayer {
                    weights: vec![vec![0.0; n]; n],
                    biases: vec![0.0; n],
                }],
                activation: Default::default(),
            },
            scaler: ScalerParams {
                mean: vec![0.0; n],
                scale: vec![1.0; n],
            },
            error_threshold: threshold,
            expected_columns: columns.iter().map(|c| (*c).to_string()).collect(),
            column_stats: BTreeMap::new(),
            temperature_columns: Vec::new(),
        }
    }

    /// Reconstructs every input as zeros, whatever its width.
    struct ZeroReconstructor;

    impl Reconstructor for ZeroReconstructor {
        fn input_width(&self) -> Option<usize> {
            None
        }

        fn reconstruct(&self, input: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
            FeatureMatrix::from_row_major(
                input.columns().to_vec(),
                input.rows(),
                vec![0.0; input.rows() * input.width()],
            )
            .ok_or_else(|| ModelError::Invalid("bad shape".to_string()))
        }
    }

    fn table(columns: &[(&str, Vec<f64>)]) -> RawTable {
        let rows = columns.first().map_or(0, |(_, v)| v.len());
        let mut t = RawTable::with_rows(rows);
        for (name, values) in columns {
            assert!(t.push_column(*name, values.iter().map(|v| CellValue::Number(*v)).collect()));
        }
        t
    }

    #[test]
    fn test_five_row_scenario() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm"], 0.5)).expect("model");
        let errors = [0.1_f64, 0.9, 0.2, 0.6, 0.05];
        let t = table(&[("pm", errors.iter().map(|e| e.sqrt()).collect())]);

        let record = MotorAnalyzer::analyze(&model, InputSource::Table(t), &AnalysisOptions::default());
        let report = record.report().expect("success");

        assert_eq!(report.anomaly_summary.total_records, 5);
        assert_eq!(report.anomaly_summary.anomaly_count, 2);
        assert!((report.anomaly_summary.anomaly_percentage - 40.0).abs() < 1e-9);
        assert_eq!(report.plot_data.anomaly_indices, vec![1, 3]);
        assert!(!report.plot_data.downsampled);
        assert_eq!(report.plot_data.original_length, 5);
        assert_eq!(
            report.plot_data.time,
            (0..5).map(TimeLabel::Index).collect::<Vec<_>>()
        );
        assert_eq!(report.sample_anomalies.len(), 2);
    }

    #[test]
    fn test_series_aligned_after_downsampling() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm", "stator_temp"], 1e9))
            .expect("model");
        let n = 25;
        let t = table(&[
            ("pm", (0..n).map(f64::from).collect()),
            ("stator_temp", (0..n).map(|i| f64::from(i) + 40.0).collect()),
        ]);
        let options = AnalysisOptions::default().with_max_data_points(10);

        let record = MotorAnalyzer::analyze(&model, InputSource::Table(t), &options);
        let report = record.report().expect("success");

        // stride = 25 / 10 = 2, ceil(25 / 2) = 13
        assert!(report.plot_data.downsampled);
        assert_eq!(report.plot_data.original_length, 25);
        assert_eq!(report.plot_data.time.len(), 13);
        assert_eq!(report.plot_data.errors.len(), 13);
        assert_eq!(report.temperature_series["stator_temp"].len(), 13);
        assert_eq!(report.temperature_series["stator_temp"][1], 42.0);
        assert_eq!(report.plot_data.time[1], TimeLabel::Index(2));

        // last is from the full-resolution matrix
        assert_eq!(report.temperature_analysis["stator_temp"].last, 64.0);
    }

    #[test]
    fn test_parameter_anomalies_reported() {
        let mut bundle = zero_bundle(&["pm"], 1e9);
        bundle.column_stats.insert(
            "pm".to_string(),
            ColumnBounds {
                min_normal: 0.0,
                max_normal: 2.0,
            },
        );
        let model = ModelArtifact::from_bundle(bundle).expect("model");
        let t = table(&[("pm", vec![1.0, 3.0, -1.0, 2.0])]);

        let report = MotorAnalyzer::analyze_table(&model, &t, &AnalysisOptions::default())
            .expect("analysis");

        assert_eq!(report.anomaly_summary.parameter_anomalies["pm"], 2);
        assert_eq!(report.column_stats["pm"].max_normal, 2.0);
    }

    #[test]
    fn test_empty_table_gives_error_record() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm"], 0.5)).expect("model");
        let record = MotorAnalyzer::analyze(
            &model,
            InputSource::Table(RawTable::default()),
            &AnalysisOptions::default(),
        );

        assert!(!record.is_success());
        assert!(record.error_message().is_some_and(|m| m.contains("empty")));
    }

    #[test]
    fn test_missing_model_gives_error_record() {
        let record = MotorAnalyzer::analyze_with_model_path(
            Path::new("/nonexistent/model.json"),
            InputSource::Table(table(&[("pm", vec![1.0])])),
            &AnalysisOptions::default(),
        );
        assert!(record
            .error_message()
            .is_some_and(|m| m.starts_with("Failed to load model")));
    }

    #[test]
    fn test_missing_data_file_gives_error_record() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm"], 0.5)).expect("model");
        let record = MotorAnalyzer::analyze(
            &model,
            InputSource::Path("/nonexistent/data.csv".into()),
            &AnalysisOptions::default(),
        );
        assert!(record
            .error_message()
            .is_some_and(|m| m.starts_with("Failed to load data")));
    }

    #[test]
    fn test_non_finite_error_gives_bare_error_record() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm"], 0.5)).expect("model");
        let t = table(&[("pm", vec![1e200, 1.0])]);

        let record = MotorAnalyzer::analyze(&model, InputSource::Table(t), &AnalysisOptions::default());

        let json = serde_json::to_value(&record).expect("json");
        let obj = json.as_object().expect("object");
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["status"], "error");
        assert_eq!(
            obj["message"],
            "Error during anomaly detection: non-finite reconstruction error at row 0"
        );
    }

    #[test]
    fn test_sample_input_reads_default_data_path() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("sample.csv");
        std::fs::write(&path, "time,pm\n0,0.1\n1,0.9\n2,0.2\n").expect("write");
        let options = AnalysisOptions {
            default_data_path: path,
            ..AnalysisOptions::default()
        };
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm"], 0.5)).expect("model");

        let record = MotorAnalyzer::analyze(&model, InputSource::from_parts(None, None), &options);
        let report = record.report().expect("success");

        assert_eq!(report.anomaly_summary.total_records, 3);
        assert_eq!(report.anomaly_summary.anomaly_count, 1);
        assert_eq!(report.plot_data.time[2], TimeLabel::Number(2.0));
    }

    #[test]
    fn test_sample_input_missing_default_file_is_data_load_error() {
        let options = AnalysisOptions {
            default_data_path: "/nonexistent/sample.csv".into(),
            ..AnalysisOptions::default()
        };
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm"], 0.5)).expect("model");

        let record = MotorAnalyzer::analyze(&model, InputSource::Sample, &options);

        assert!(record
            .error_message()
            .is_some_and(|m| m.starts_with("Failed to load data") && m.contains("sample.csv")));
    }

    #[test]
    fn test_fixed_width_model_rejects_reduced_features() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm", "ambient"], 0.5)).expect("model");
        let t = table(&[("pm", vec![1.0, 2.0])]);

        let record = MotorAnalyzer::analyze(&model, InputSource::Table(t), &AnalysisOptions::default());

        assert!(record
            .error_message()
            .is_some_and(|m| m.starts_with("Error during anomaly detection")));
    }

    #[test]
    fn test_width_agnostic_model_runs_on_reduced_features() {
        let columns: Vec<String> = ["pm", "ambient", "torque"].iter().map(|c| (*c).to_string()).collect();
        let scaler = StandardScaler::new(
            columns.clone(),
            ScalerParams {
                mean: vec![0.0; 3],
                scale: vec![1.0; 3],
            },
        )
        .expect("scaler");
        let model = ModelArtifact::new(
            Box::new(ZeroReconstructor),
            Box::new(scaler),
            10.0,
            columns,
            BTreeMap::new(),
            Vec::new(),
        )
        .expect("model");
        let t = table(&[("torque", vec![1.0, 2.0, 3.0]), ("pm", vec![0.0, 0.0, 5.0])]);

        let report = MotorAnalyzer::analyze_table(&model, &t, &AnalysisOptions::default())
            .expect("analysis");

        assert_eq!(report.anomaly_summary.total_records, 3);
        assert_eq!(report.anomaly_summary.anomaly_count, 1);
        assert_eq!(report.data_quality.columns_missing, vec!["ambient"]);
        assert!(report.data_quality.reduced_confidence);
    }

    #[test]
    fn test_repeat_runs_identical_apart_from_timestamp() {
        let model = ModelArtifact::from_bundle(zero_bundle(&["pm", "coolant_temperature"], 0.5))
            .expect("model");
        let t = table(&[
            ("pm", vec![0.1, 0.9, 0.3]),
            ("coolant", vec![18.0, 19.0, 20.0]),
        ]);
        let options = AnalysisOptions::default();

        let mut a = MotorAnalyzer::analyze_table(&model, &t, &options).expect("first");
        let mut b = MotorAnalyzer::analyze_table(&model, &t, &options).expect("second");
        a.timestamp.clear();
        b.timestamp.clear();

        assert_eq!(
            serde_json::to_string(&a).expect("json"),
            serde_json::to_string(&b).expect("json")
        );
    }
}
