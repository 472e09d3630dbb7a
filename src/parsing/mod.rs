use std::path::Path;

use ndarray::{Array, Array2, ArrayView, ArrayView2, Axis};
use tracing::debug;

use crate::error::{ElmError, Result};

pub mod housing;
pub mod mnist;

/// Rows of numeric features, each with an integer class code
///
/// Class codes start at 1 and follow the order of the `ClassSet` the table
/// was loaded with.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub features: Array2<f64>,
    pub labels: Vec<usize>,
}

impl LabeledTable {
    pub fn new(features: Array2<f64>, labels: Vec<usize>) -> Result<LabeledTable> {
        if features.nrows() != labels.len() {
            return Err(ElmError::SizeMismatch {
                left: features.nrows(),
                right: labels.len(),
            });
        }

        Ok(LabeledTable { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> ArrayView2<f64> {
        self.features.view()
    }

    /// Copy out the given rows, in the given order
    pub fn select(&self, rows: &[usize]) -> LabeledTable {
        LabeledTable {
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&row| self.labels[row]).collect(),
        }
    }

    /// The labels as floats, the regression target of the classifier
    pub fn targets(&self) -> Vec<f64> {
        self.labels.iter().map(|&label| label as f64).collect()
    }
}

/// The declared class names. A name's code is its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSet {
    names: Vec<String>,
}

impl ClassSet {
    pub fn new(names: Vec<String>) -> ClassSet {
        ClassSet { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn code(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|known| known == name)
            .map(|idx| idx + 1)
            .ok_or_else(|| ElmError::UnknownLabel {
                label: name.to_string(),
            })
    }

    pub fn name(&self, code: usize) -> Option<&str> {
        code.checked_sub(1)
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
    }
}

/// Load a headerless delimited table of the form <x1>,<x2>,...,<label>
///
/// Every column but the last must be numeric. The label column is mapped to
/// its class code right here, so the returned table never holds names.
pub fn load_table(path: &Path, classes: &ClassSet) -> Result<LabeledTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut data: Option<Array2<f64>> = None;
    let mut labels = vec![];

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());

        // Whitespace-only lines trim down to a single empty field
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() < 2 {
            return Err(ElmError::MalformedRow {
                line,
                reason: "expected at least one feature and a label".to_string(),
            });
        }

        let values = record.len() - 1;
        let label = &record[values];
        let mut row = Vec::with_capacity(values);
        for (column, field) in record.iter().take(values).enumerate() {
            let value = field.parse::<f64>().map_err(|_| ElmError::Parse {
                line,
                column,
                value: field.to_string(),
            })?;
            row.push(value);
        }

        let table = data.get_or_insert_with(|| Array::zeros((0, values)));
        table
            .push_row(ArrayView::from(&row))
            .map_err(|err| ElmError::MalformedRow {
                line,
                reason: err.to_string(),
            })?;
        labels.push(classes.code(label)?);
    }

    let features = data.unwrap_or_else(|| Array::zeros((0, 0)));
    debug!(rows = features.nrows(), cols = features.ncols(), "loaded table");

    LabeledTable::new(features, labels)
}
