//! Raw input tables and the numeric feature matrix derived from them.

use serde::{Deserialize, Serialize};

/// A single raw cell as read from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Parse a raw CSV field. Empty fields become `Missing`, anything that
    /// parses as a float becomes `Number`, everything else stays `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Self::Number(v),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// Numeric coercion. Non-numeric text and non-finite numbers are missing.
    pub fn to_finite(&self) -> Option<f64> {
        match self {
            Self::Number(v) if v.is_finite() => Some(*v),
            Self::Number(_) | Self::Missing => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One named column of raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// Column-major raw input table.
///
/// Column order follows the input header. Every column holds exactly
/// `row_count` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    row_count: usize,
}

impl RawTable {
    /// Empty table with a fixed number of rows, ready for `push_column`.
    pub fn with_rows(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            row_count,
        }
    }

    /// Build from a header and row-major records. Short records are padded
    /// with `Missing`, extra trailing fields are ignored. Duplicate header
    /// names keep their first occurrence.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<CellValue>>) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<RawColumn> = Vec::with_capacity(headers.len());
        let mut keep: Vec<bool> = Vec::with_capacity(headers.len());

        for name in headers {
            let duplicate = columns.iter().any(|c| &c.name == name);
            if duplicate {
                tracing::warn!(column = %name, "Duplicate column header, keeping first occurrence");
            } else {
                columns.push(RawColumn {
                    name: name.clone(),
                    values: Vec::with_capacity(row_count),
                });
            }
            keep.push(!duplicate);
        }

        for row in rows {
            let mut fields = row.into_iter();
            let mut target = 0;
            for &kept in &keep {
                let value = fields.next().unwrap_or(CellValue::Missing);
                if kept {
                    columns[target].values.push(value);
                    target += 1;
                }
            }
        }

        Self { columns, row_count }
    }

    /// Append or replace a column. The value count must match `row_count`.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<CellValue>) -> bool {
        if values.len() != self.row_count {
            return false;
        }
        let name = name.into();
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            existing.values = values;
        } else {
            self.columns.push(RawColumn { name, values });
        }
        true
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Row-major numeric matrix with named columns.
///
/// This is exactly what the scaler and reconstructor see: columns are a
/// subsequence of the model's expected columns, in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Build from per-column vectors of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Option<Self> {
        let rows = columns.first().map_or(0, |(_, v)| v.len());
        if columns.iter().any(|(_, v)| v.len() != rows) {
            return None;
        }
        let width = columns.len();
        let mut data = vec![0.0; rows * width];
        for (j, (_, values)) in columns.iter().enumerate() {
            for (i, v) in values.iter().enumerate() {
                data[i * width + j] = *v;
            }
        }
        Some(Self {
            columns: columns.into_iter().map(|(name, _)| name).collect(),
            rows,
            data,
        })
    }

    /// Build from flat row-major storage.
    pub fn from_row_major(columns: Vec<String>, rows: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == rows * columns.len()).then_some(Self {
            columns,
            rows,
            data,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let w = self.width();
        &self.data[i * w..(i + 1) * w]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy out one column by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.column_index(name)?;
        let w = self.width();
        Some((0..self.rows).map(|i| self.data[i * w + j]).collect())
    }
}
