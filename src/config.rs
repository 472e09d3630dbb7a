use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ElmError, Result};
use crate::model::elm::Activation;
use crate::parsing::ClassSet;

/// Hyperparameters of one classification run
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```toml
/// train_ratio = 0.7
/// hidden_dimension = 10
/// activation = "sigmoid"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElmConfig {
    /// Fraction of each class placed in the training set
    pub train_ratio: f64,
    /// Width of the random-projection layer
    pub hidden_dimension: usize,
    pub activation: Activation,
    /// Seed for both the split and the weight initialization
    pub seed: u64,
    /// Declared class names, in code order (first name is class 1)
    pub classes: Vec<String>,
}

impl Default for ElmConfig {
    fn default() -> Self {
        ElmConfig {
            train_ratio: 0.8,
            hidden_dimension: 2,
            activation: Activation::Relu,
            seed: 0,
            classes: vec![
                "Iris-setosa".to_string(),
                "Iris-versicolor".to_string(),
                "Iris-virginica".to_string(),
            ],
        }
    }
}

impl ElmConfig {
    /// Read a config from a TOML file
    pub fn from_file(path: &Path) -> Result<ElmConfig> {
        let text = fs::read_to_string(path).map_err(|source| ElmError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| ElmError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the splitter or the classifier would refuse later on
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ElmError::InvalidRatio {
                ratio: self.train_ratio,
            });
        }
        if self.hidden_dimension == 0 {
            return Err(ElmError::InvalidHiddenDimension);
        }
        if self.classes.is_empty() {
            return Err(ElmError::NoClasses);
        }

        Ok(())
    }

    pub fn class_set(&self) -> ClassSet {
        ClassSet::new(self.classes.clone())
    }
}
