use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, splitting, training or scoring
#[derive(Debug, Error)]
pub enum ElmError {
    /// The input table has no rows
    #[error("dataset has no rows")]
    EmptyDataset,

    /// The train/test ratio is not strictly between 0 and 1
    #[error("ratio must be strictly between 0 and 1, got {ratio}")]
    InvalidRatio { ratio: f64 },

    /// A label is not part of the declared class set
    #[error("unknown label `{label}`")]
    UnknownLabel { label: String },

    /// Two sequences that must line up have different lengths
    #[error("size mismatch: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("model has not been trained")]
    ModelNotTrained,

    #[error("model is already trained, build a new classifier to retrain")]
    AlreadyTrained,

    /// A requested data row is past the end of the file
    #[error("row {index} requested, but the file has {rows} data rows")]
    RowOutOfRange { index: usize, rows: usize },

    #[error("no class names declared")]
    NoClasses,

    #[error("hidden dimension must be at least 1")]
    InvalidHiddenDimension,

    /// Inference input has a different width than the training features
    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("pseudoinverse failed: {0}")]
    Pseudoinverse(String),

    /// A field could not be parsed as a number
    #[error("line {line}, column {column}: cannot parse `{value}` as a number")]
    Parse {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ElmError>;
