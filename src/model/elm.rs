use nalgebra::DMatrix;
use ndarray::{Array, Array1, Array2, ArrayView2};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ElmError, Result};
use crate::parsing::LabeledTable;

use super::{Model, Predictions};

/// Extreme Learning Machine: one hidden layer of fixed random weights whose
/// output weights are solved in closed form
///
/// A classifier is trained at most once. Retraining means building a new
/// `Elm`, so a fitted parameter set never changes under a reader.
#[derive(Debug, Clone)]
pub struct Elm {
    hidden_dimension: usize,
    activation: Activation,
    num_classes: usize,
    parameters: Option<ModelParameters>,
}

/// Everything `predict` needs, fixed once `fit` returns
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    /// Shape (features, hidden), drawn from U[0, 1)
    pub input_weights: Array2<f64>,
    /// Shape (hidden), drawn from U[0, 1)
    pub input_bias: Array1<f64>,
    /// Output weights, shape (hidden)
    pub beta: Array1<f64>,
    pub activation: Activation,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    Relu,
}

impl Activation {
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Relu => "relu",
        }
    }
}

impl Elm {
    /// Construct an untrained classifier
    pub fn new(hidden_dimension: usize, activation: Activation, num_classes: usize) -> Elm {
        Elm {
            hidden_dimension,
            activation,
            num_classes,
            parameters: None,
        }
    }

    pub fn hidden_dimension(&self) -> usize {
        self.hidden_dimension
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Class codes are `1..=num_classes`
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn is_trained(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn parameters(&self) -> Option<&ModelParameters> {
        self.parameters.as_ref()
    }

    fn check_training_set(&self, dataset: &LabeledTable) -> Result<()> {
        if dataset.is_empty() {
            return Err(ElmError::EmptyDataset);
        }
        if self.hidden_dimension == 0 {
            return Err(ElmError::InvalidHiddenDimension);
        }
        if dataset.features.nrows() != dataset.labels.len() {
            return Err(ElmError::SizeMismatch {
                left: dataset.features.nrows(),
                right: dataset.labels.len(),
            });
        }
        if let Some(&label) = dataset
            .labels
            .iter()
            .find(|&&label| label == 0 || label > self.num_classes)
        {
            return Err(ElmError::UnknownLabel {
                label: label.to_string(),
            });
        }

        Ok(())
    }
}

impl Model for Elm {
    /// Draw the hidden layer and solve for the output weights
    fn fit(&mut self, dataset: &LabeledTable, seed: u64) -> Result<()> {
        if self.is_trained() {
            return Err(ElmError::AlreadyTrained);
        }
        self.check_training_set(dataset)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let distribution = Uniform::new(0f64, 1f64);

        let input_weights = Array::zeros((dataset.num_features(), self.hidden_dimension))
            .map(|_: &f64| distribution.sample(&mut rng));
        let input_bias =
            Array::zeros(self.hidden_dimension).map(|_: &f64| distribution.sample(&mut rng));

        let hidden = hidden_output(
            &dataset.features(),
            &input_weights,
            &input_bias,
            self.activation,
        );
        debug!(rows = hidden.nrows(), cols = hidden.ncols(), "hidden layer output");

        let targets = Array1::from(dataset.targets());
        let beta = pseudoinverse(&hidden)?.dot(&targets);
        debug!(len = beta.len(), "solved output weights");

        self.parameters = Some(ModelParameters {
            input_weights,
            input_bias,
            beta,
            activation: self.activation,
        });

        Ok(())
    }

    /// Score each row and snap the score to a class code
    fn predict(&self, inputs: &ArrayView2<f64>) -> Result<Predictions> {
        let parameters = self.parameters.as_ref().ok_or(ElmError::ModelNotTrained)?;

        let expected = parameters.input_weights.nrows();
        if inputs.ncols() != expected {
            return Err(ElmError::FeatureMismatch {
                expected,
                actual: inputs.ncols(),
            });
        }

        let hidden = hidden_output(
            inputs,
            &parameters.input_weights,
            &parameters.input_bias,
            parameters.activation,
        );
        let raw = hidden.dot(&parameters.beta);
        let classes = raw
            .iter()
            .map(|&score| discretize(score, self.num_classes))
            .collect();

        Ok(Predictions { raw, classes })
    }
}

fn activation(name: Activation, z: f64) -> f64 {
    match name {
        Activation::Relu => z.max(0f64),
        Activation::Sigmoid => (1f64 + (-z).exp()).recip(),
    }
}

/// H = act(X W + b), with the bias broadcast over the rows
fn hidden_output(
    inputs: &ArrayView2<f64>,
    weights: &Array2<f64>,
    bias: &Array1<f64>,
    name: Activation,
) -> Array2<f64> {
    let lin_output = inputs.dot(weights) + bias;

    lin_output.map(|x| activation(name, *x))
}

/// Moore-Penrose pseudoinverse through an SVD
///
/// Singular values below `max(rows, cols) * eps * largest` count as zero, so a
/// rank-deficient matrix gets the minimum-norm least-squares inverse.
pub fn pseudoinverse(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(ElmError::Pseudoinverse(
            "matrix has non-finite entries".to_string(),
        ));
    }

    let (rows, cols) = matrix.dim();
    let dense = DMatrix::from_fn(rows, cols, |i, j| matrix[[i, j]]);
    let svd = dense
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or_else(|| ElmError::Pseudoinverse("SVD did not converge".to_string()))?;

    let largest = svd.singular_values.iter().fold(0f64, |acc, &s| acc.max(s));
    let tolerance = largest * rows.max(cols) as f64 * f64::EPSILON;
    let inverse = svd
        .pseudo_inverse(tolerance)
        .map_err(|err| ElmError::Pseudoinverse(err.to_string()))?;

    Ok(Array2::from_shape_fn(inverse.shape(), |(i, j)| {
        inverse[(i, j)]
    }))
}

/// Snap a raw score to a class code in `1..=num_classes`
///
/// Classes are tried in ascending order and the first one within 0.5 of the
/// score wins, so a score of exactly 1.5 maps to class 1. Scores left over are
/// clamped to the nearest end of the range; NaN maps to class 1.
pub fn discretize(score: f64, num_classes: usize) -> usize {
    for class in 1..=num_classes {
        if (score - class as f64).abs() <= 0.5 {
            return class;
        }
    }

    if score > num_classes as f64 {
        num_classes
    } else {
        1
    }
}
