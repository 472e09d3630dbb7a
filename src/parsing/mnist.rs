use std::path::Path;

use ndarray::Array2;

use crate::error::{ElmError, Result};

const IMAGE_SIDE: usize = 28;
const NUM_FEATURES: usize = IMAGE_SIDE * IMAGE_SIDE;
const LINE_SIZE: usize = NUM_FEATURES + 1;
const GREYSCALE_SIZE: f64 = 255f64;

/// Characters from dark to bright, used to shade one pixel
const SHADES: &[u8] = b" .:-=+*#%@";

/// A single handwritten digit
#[derive(Debug, Clone, PartialEq)]
pub struct Digit {
    pub label: u8,
    /// Grey levels normalized to [0, 1], one row per image row
    pub pixels: Array2<f64>,
}

/// Parse a line in the dataset. Return the pixels and the label
/// Line is stored in the format: <label>,<pixel0x0>,<pixel0x1>,...
/// The dataset is taken from here https://www.kaggle.com/datasets/oddrationale/mnist-in-csv
fn parse_digit_record(record: &csv::StringRecord, line: u64) -> Result<Digit> {
    if record.len() != LINE_SIZE {
        return Err(ElmError::MalformedRow {
            line,
            reason: format!("expected {} fields, got {}", LINE_SIZE, record.len()),
        });
    }

    let label = record[0].parse::<u8>().map_err(|_| ElmError::Parse {
        line,
        column: 0,
        value: record[0].to_string(),
    })?;

    let mut pixels = Vec::with_capacity(NUM_FEATURES);
    for (column, field) in record.iter().enumerate().skip(1) {
        let value = field.parse::<f64>().map_err(|_| ElmError::Parse {
            line,
            column,
            value: field.to_string(),
        })?;
        // we divide by 255 to normalize
        pixels.push(value / GREYSCALE_SIZE);
    }

    let pixels = Array2::from_shape_vec((IMAGE_SIDE, IMAGE_SIDE), pixels).map_err(|err| {
        ElmError::MalformedRow {
            line,
            reason: err.to_string(),
        }
    })?;

    Ok(Digit { label, pixels })
}

/// Load the digit stored at data row `index` (0-based, not counting a header)
pub fn load_digit(path: &Path, index: usize, has_header: bool) -> Result<Digit> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .from_path(path)?;

    let mut seen = 0;
    for record in reader.records() {
        let record = record?;
        if seen == index {
            let line = record.position().map_or(0, |pos| pos.line());
            return parse_digit_record(&record, line);
        }
        seen += 1;
    }

    Err(ElmError::RowOutOfRange { index, rows: seen })
}

/// Draw the digit as text, one character per pixel
pub fn render(digit: &Digit) -> String {
    let mut out = String::with_capacity(digit.pixels.len() + digit.pixels.nrows());

    for row in digit.pixels.rows() {
        for &value in row {
            let level = (value.clamp(0f64, 1f64) * (SHADES.len() - 1) as f64).round() as usize;
            out.push(SHADES[level] as char);
        }
        out.push('\n');
    }

    out
}
