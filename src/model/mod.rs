use ndarray::{Array1, ArrayView2};

use crate::error::Result;
use crate::parsing::LabeledTable;

pub mod elm;
pub mod metrics;

/// Output of one inference call
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    /// Scores before thresholding
    pub raw: Array1<f64>,
    /// Class codes after thresholding
    pub classes: Vec<usize>,
}

pub trait Model {
    fn fit(&mut self, dataset: &LabeledTable, seed: u64) -> Result<()>;
    fn predict(&self, inputs: &ArrayView2<f64>) -> Result<Predictions>;
}
