//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Model
// ============================================================================

/// Model artifact path used when no config file names one.
pub const MODEL_PATH: &str = "motor_anomaly_model.json";

// ============================================================================
// Input
// ============================================================================

/// Input file analysed when the caller gives neither a path nor a table.
pub const DEFAULT_DATA_PATH: &str = "sample_data/sampled_data_100000.csv";

/// Voltage/current channels and the wall-clock column, never fed to the model.
pub const EXCLUDED_COLUMNS: [&str; 5] = ["u_q", "u_d", "i_d", "i_q", "time"];

/// Column carrying plot time labels.
pub const TIME_COLUMN: &str = "time";

/// Legacy name of the coolant sensor column.
pub const COOLANT_ALIAS: &str = "coolant";

/// Canonical coolant column name the model was trained with.
pub const COOLANT_CANONICAL: &str = "coolant_temperature";

/// Case-insensitive substrings marking a temperature column.
pub const TEMPERATURE_KEYWORDS: [&str; 2] = ["temp", "temperature"];

// ============================================================================
// Output
// ============================================================================

/// Upper bound on plotted points per series.
pub const MAX_DATA_POINTS: usize = 1_000;

/// Number of anomalous rows echoed in `sample_anomalies`.
pub const SAMPLE_ANOMALY_LIMIT: usize = 5;

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "MOTOR_SENTINEL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "motor_sentinel.toml";
