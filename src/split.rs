//! Train/test splitting.
//!
//! The stratified split keeps every class's share of the data the same in the
//! training and the test set. Per class of `n` rows the training set gets
//! `round(ratio * n)` rows, rounding half up, so a class of one row lands in
//! the training set exactly when `ratio >= 0.5`.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::{ElmError, Result};
use crate::parsing::{ClassSet, LabeledTable};

/// A training table and a test table that together hold every input row once
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: LabeledTable,
    pub test: LabeledTable,
}

fn check_ratio(ratio: f64) -> Result<()> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(ElmError::InvalidRatio { ratio })
    }
}

/// Slack absorbing float error in `size * ratio`, so that products meant to
/// be exact halves (45 * 0.7) still round up
const HALF_UP_SLACK: f64 = 1e-9;

/// Number of rows of a class of `size` rows that go to the training set
pub fn train_count(size: usize, ratio: f64) -> usize {
    ((size as f64 * ratio + 0.5 + HALF_UP_SLACK).floor() as usize).min(size)
}

/// Stratified split on row indices
///
/// `labels` hold class codes in `1..=num_classes`. Returns the (train, test)
/// row indices, each shuffled so that their order does not reveal the class
/// grouping.
pub fn stratified_indices(
    labels: &[usize],
    num_classes: usize,
    train_ratio: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if labels.is_empty() {
        return Err(ElmError::EmptyDataset);
    }
    check_ratio(train_ratio)?;

    // Group samples by class
    let mut partitions: Vec<Vec<usize>> = vec![vec![]; num_classes];
    for (row, &label) in labels.iter().enumerate() {
        if label == 0 || label > num_classes {
            return Err(ElmError::UnknownLabel {
                label: label.to_string(),
            });
        }
        partitions[label - 1].push(row);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::with_capacity(labels.len());

    for (class, rows) in partitions.iter_mut().enumerate() {
        rows.shuffle(&mut rng);

        let cut = train_count(rows.len(), train_ratio);
        debug!(
            class = class + 1,
            size = rows.len(),
            train = cut,
            "partitioned class"
        );
        train.extend_from_slice(&rows[..cut]);
        test.extend_from_slice(&rows[cut..]);
    }

    // Shuffle the combined sets
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok((train, test))
}

/// Split a table so each class keeps the same share in train and test
pub fn split_stratified(
    table: &LabeledTable,
    classes: &ClassSet,
    train_ratio: f64,
    seed: u64,
) -> Result<Split> {
    let (train, test) = stratified_indices(&table.labels, classes.len(), train_ratio, seed)?;

    Ok(Split {
        train: table.select(&train),
        test: table.select(&test),
    })
}

/// Plain shuffled split of `len` rows, ignoring classes
///
/// The first `floor(len * test_ratio)` indices of one permutation form the
/// test set. Returns the (train, test) row indices.
pub fn split_random(len: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if len == 0 {
        return Err(ElmError::EmptyDataset);
    }
    check_ratio(test_ratio)?;

    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = (len as f64 * test_ratio) as usize;
    let train = indices.split_off(test_size);

    Ok((train, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn classes(n: usize) -> ClassSet {
        ClassSet::new((1..=n).map(|c| format!("class-{}", c)).collect())
    }

    /// Rows are tagged with their own index in column 0 so they can be traced
    fn table(labels: Vec<usize>) -> LabeledTable {
        let features =
            Array2::from_shape_fn((labels.len(), 2), |(row, col)| (row * (col + 1)) as f64);
        LabeledTable::new(features, labels).unwrap()
    }

    fn count(labels: &[usize], class: usize) -> usize {
        labels.iter().filter(|&&label| label == class).count()
    }

    #[test]
    fn split_keeps_every_row_once() {
        let input = table((0..30).map(|row| row % 3 + 1).collect());
        let split = split_stratified(&input, &classes(3), 0.8, 7).unwrap();

        assert_eq!(split.train.len() + split.test.len(), input.len());

        let mut ids: Vec<usize> = split
            .train
            .features
            .column(0)
            .iter()
            .chain(split.test.features.column(0).iter())
            .map(|&id| id as usize)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..30).collect::<Vec<_>>());

        // Labels travel with their rows
        for part in [&split.train, &split.test] {
            for (row, &label) in part.labels.iter().enumerate() {
                let id = part.features[[row, 0]] as usize;
                assert_eq!(label, input.labels[id]);
            }
        }
    }

    #[test]
    fn split_is_stratified() {
        let labels: Vec<usize> = std::iter::repeat(1)
            .take(50)
            .chain(std::iter::repeat(2).take(30))
            .chain(std::iter::repeat(3).take(7))
            .collect();
        let input = table(labels);
        let split = split_stratified(&input, &classes(3), 0.8, 0).unwrap();

        assert_eq!(count(&split.train.labels, 1), 40);
        assert_eq!(count(&split.train.labels, 2), 24);
        // 5.6 rounds up to 6
        assert_eq!(count(&split.train.labels, 3), 6);
        assert_eq!(count(&split.test.labels, 3), 1);
    }

    #[test]
    fn split_is_deterministic() {
        let input = table((0..40).map(|row| row % 2 + 1).collect());

        let first = split_stratified(&input, &classes(2), 0.75, 42).unwrap();
        let second = split_stratified(&input, &classes(2), 0.75, 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn train_rows_are_not_grouped_by_class() {
        let input = table((0..60).map(|row| row / 20 + 1).collect());
        let split = split_stratified(&input, &classes(3), 0.5, 3).unwrap();

        let mut sorted = split.train.labels.clone();
        sorted.sort_unstable();
        assert_ne!(split.train.labels, sorted);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(train_count(1, 0.5), 1);
        assert_eq!(train_count(1, 0.4), 0);
        assert_eq!(train_count(5, 0.5), 3);
        assert_eq!(train_count(7, 0.8), 6);
        assert_eq!(train_count(0, 0.8), 0);
    }

    #[test]
    fn exact_halves_round_up_despite_float_error() {
        // 45 * 0.7 and 90 * 0.35 evaluate to just under 31.5
        assert_eq!(train_count(45, 0.7), 32);
        assert_eq!(train_count(90, 0.35), 32);
        assert_eq!(train_count(25, 0.58), 15);
        assert_eq!(train_count(50, 0.29), 15);
        assert_eq!(train_count(10, 0.33), 3);
        assert_eq!(train_count(3, 0.99), 3);
    }

    #[test]
    fn single_row_class_follows_rounding() {
        let input = table(vec![1, 1, 1, 1, 2]);

        let split = split_stratified(&input, &classes(2), 0.6, 1).unwrap();
        assert_eq!(count(&split.train.labels, 2), 1);

        let split = split_stratified(&input, &classes(2), 0.4, 1).unwrap();
        assert_eq!(count(&split.test.labels, 2), 1);
    }

    #[test]
    fn empty_class_contributes_nothing() {
        let input = table(vec![1, 1, 3, 3]);
        let split = split_stratified(&input, &classes(3), 0.5, 9).unwrap();

        assert_eq!(count(&split.train.labels, 2), 0);
        assert_eq!(count(&split.test.labels, 2), 0);
        assert_eq!(split.train.len(), 2);
    }

    #[test]
    fn split_rejects_bad_input() {
        let empty = table(vec![]);
        assert!(matches!(
            split_stratified(&empty, &classes(3), 0.8, 0),
            Err(ElmError::EmptyDataset)
        ));

        let input = table(vec![1, 2, 3]);
        for ratio in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                split_stratified(&input, &classes(3), ratio, 0),
                Err(ElmError::InvalidRatio { .. })
            ));
        }

        let input = table(vec![1, 4]);
        assert!(matches!(
            split_stratified(&input, &classes(3), 0.8, 0),
            Err(ElmError::UnknownLabel { label }) if label == "4"
        ));
    }

    #[test]
    fn random_split_truncates_test_size() {
        let (train, test) = split_random(11, 0.2, 42).unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 9);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..11).collect::<Vec<_>>());

        assert_eq!(split_random(11, 0.2, 42).unwrap(), (train, test));
        assert!(matches!(split_random(0, 0.2, 42), Err(ElmError::EmptyDataset)));
    }
}
