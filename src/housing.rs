//! Exploratory split of the housing dataset.
//!
//! Districts are stratified on an income category so the training and test
//! sets keep the income distribution of the whole dataset.

use tracing::{debug, info};

use crate::error::{ElmError, Result};
use crate::parsing::housing::HousingRecord;
use crate::split::{split_random, stratified_indices};

/// Number of income categories; everything above the last bucket joins it
pub const INCOME_CATEGORIES: usize = 5;

/// Width of one income bucket, in units of median_income
const INCOME_BUCKET: f64 = 1.5;

/// Income category in `1..=INCOME_CATEGORIES`
pub fn income_category(median_income: f64) -> usize {
    let bucket = (median_income / INCOME_BUCKET).ceil();
    if bucket.is_nan() || bucket < 1.0 {
        1
    } else {
        (bucket as usize).min(INCOME_CATEGORIES)
    }
}

/// Share of each income category, index 0 is category 1
pub fn category_proportions(records: &[&HousingRecord]) -> [f64; INCOME_CATEGORIES] {
    let mut shares = [0f64; INCOME_CATEGORIES];
    if records.is_empty() {
        return shares;
    }

    for record in records {
        shares[income_category(record.median_income) - 1] += 1.0;
    }
    for share in shares.iter_mut() {
        *share /= records.len() as f64;
    }

    shares
}

/// Median of the known `total_bedrooms` values
pub fn bedrooms_median(records: &[&HousingRecord]) -> Option<f64> {
    let mut known: Vec<f64> = records
        .iter()
        .filter_map(|record| record.total_bedrooms)
        .collect();
    if known.is_empty() {
        return None;
    }

    known.sort_by(|a, b| a.total_cmp(b));
    let mid = known.len() / 2;
    if known.len() % 2 == 0 {
        Some((known[mid - 1] + known[mid]) / 2.0)
    } else {
        Some(known[mid])
    }
}

/// Replace missing `total_bedrooms` with `value`, returning how many were filled
pub fn fill_bedrooms(records: &mut [HousingRecord], value: f64) -> usize {
    let mut filled = 0;
    for record in records.iter_mut().filter(|r| r.total_bedrooms.is_none()) {
        record.total_bedrooms = Some(value);
        filled += 1;
    }

    filled
}

/// Result of splitting the housing data
#[derive(Debug, Clone, PartialEq)]
pub struct HousingSplit {
    pub train: Vec<HousingRecord>,
    pub test: Vec<HousingRecord>,
    pub overall: [f64; INCOME_CATEGORIES],
    pub train_proportions: [f64; INCOME_CATEGORIES],
    pub test_proportions: [f64; INCOME_CATEGORIES],
    /// Training-set median used to fill missing bedroom counts
    pub bedrooms_median: Option<f64>,
    /// Missing bedroom counts filled in the training set
    pub filled: usize,
}

/// Split the districts into train and test sets
///
/// With `stratified` the income categories keep their share in both sets,
/// otherwise the split is a plain random permutation.
pub fn split_housing(
    records: &[HousingRecord],
    test_ratio: f64,
    seed: u64,
    stratified: bool,
) -> Result<HousingSplit> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ElmError::InvalidRatio { ratio: test_ratio });
    }

    let (train_rows, test_rows) = if stratified {
        let categories: Vec<usize> = records
            .iter()
            .map(|record| income_category(record.median_income))
            .collect();
        stratified_indices(&categories, INCOME_CATEGORIES, 1.0 - test_ratio, seed)?
    } else {
        split_random(records.len(), test_ratio, seed)?
    };
    debug!(train = train_rows.len(), test = test_rows.len(), "split housing data");

    let all: Vec<&HousingRecord> = records.iter().collect();
    let mut train: Vec<HousingRecord> = train_rows.iter().map(|&row| records[row].clone()).collect();
    let test: Vec<HousingRecord> = test_rows.iter().map(|&row| records[row].clone()).collect();

    let train_refs: Vec<&HousingRecord> = train.iter().collect();
    let test_refs: Vec<&HousingRecord> = test.iter().collect();
    let overall = category_proportions(&all);
    let train_proportions = category_proportions(&train_refs);
    let test_proportions = category_proportions(&test_refs);
    let median = bedrooms_median(&train_refs);

    let filled = match median {
        Some(value) => fill_bedrooms(&mut train, value),
        None => 0,
    };
    info!(filled, "filled missing bedroom counts");

    Ok(HousingSplit {
        train,
        test,
        overall,
        train_proportions,
        test_proportions,
        bedrooms_median: median,
        filled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(median_income: f64, total_bedrooms: Option<f64>) -> HousingRecord {
        HousingRecord {
            longitude: -122.0,
            latitude: 37.0,
            housing_median_age: 20.0,
            total_rooms: 1000.0,
            total_bedrooms,
            population: 500.0,
            households: 200.0,
            median_income,
            median_house_value: 200000.0,
            ocean_proximity: "INLAND".to_string(),
        }
    }

    #[test]
    fn income_categories() {
        assert_eq!(income_category(0.5), 1);
        assert_eq!(income_category(1.5), 1);
        assert_eq!(income_category(1.6), 2);
        assert_eq!(income_category(4.5), 3);
        assert_eq!(income_category(7.4), 5);
        assert_eq!(income_category(15.0), 5);
        assert_eq!(income_category(0.0), 1);
    }

    #[test]
    fn median_of_known_bedrooms() {
        let records = vec![
            record(1.0, Some(3.0)),
            record(1.0, None),
            record(1.0, Some(1.0)),
            record(1.0, Some(10.0)),
            record(1.0, Some(4.0)),
        ];
        let refs: Vec<&HousingRecord> = records.iter().collect();
        assert_eq!(bedrooms_median(&refs), Some(3.5));
        assert_eq!(bedrooms_median(&refs[..3]), Some(2.0));
        assert_eq!(bedrooms_median(&refs[1..2]), None);
    }

    #[test]
    fn stratified_split_keeps_income_shares() {
        // 50 districts in category 1, 30 in category 3, 20 in category 5
        let records: Vec<HousingRecord> = (0..100)
            .map(|idx| {
                let income = match idx {
                    0..=49 => 1.0,
                    50..=79 => 4.0,
                    _ => 9.0,
                };
                record(income, if idx % 10 == 0 { None } else { Some(idx as f64) })
            })
            .collect();

        let split = split_housing(&records, 0.2, 42, true).unwrap();
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
        for (overall, (train, test)) in split
            .overall
            .iter()
            .zip(split.train_proportions.iter().zip(split.test_proportions.iter()))
        {
            assert!((overall - train).abs() < 1e-9);
            assert!((overall - test).abs() < 1e-9);
        }
        assert!(split.bedrooms_median.is_some());
        assert!(split.train.iter().all(|r| r.total_bedrooms.is_some()));
    }

    #[test]
    fn random_split_sizes() {
        let records: Vec<HousingRecord> = (0..10).map(|_| record(2.0, Some(1.0))).collect();
        let split = split_housing(&records, 0.25, 1, false).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.filled, 0);
    }

    #[test]
    fn rejects_bad_ratio() {
        let records = vec![record(2.0, None)];
        assert!(matches!(
            split_housing(&records, 1.0, 1, true),
            Err(ElmError::InvalidRatio { .. })
        ));
    }
}
