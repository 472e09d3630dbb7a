use crate::error::{ElmError, Result};

/// Percentage of positions where the predicted class equals the actual one
pub fn accuracy(predicted: &[usize], actual: &[usize]) -> Result<f64> {
    if predicted.len() != actual.len() {
        return Err(ElmError::SizeMismatch {
            left: predicted.len(),
            right: actual.len(),
        });
    }
    if actual.is_empty() {
        return Err(ElmError::EmptyDataset);
    }

    let correct = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p == a)
        .count();

    Ok(100f64 * correct as f64 / actual.len() as f64)
}
