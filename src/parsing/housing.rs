use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

/// One district of the California housing dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HousingRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    /// Missing for a few hundred districts
    pub total_bedrooms: Option<f64>,
    pub population: f64,
    pub households: f64,
    pub median_income: f64,
    pub median_house_value: f64,
    pub ocean_proximity: String,
}

/// Load a headered housing CSV
pub fn load_housing(path: &Path) -> Result<Vec<HousingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<HousingRecord>, csv::Error>>()?;
    debug!(rows = records.len(), "loaded housing data");

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_bedrooms_become_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "longitude,latitude,housing_median_age,total_rooms,total_bedrooms,population,households,median_income,median_house_value,ocean_proximity"
        )
        .unwrap();
        writeln!(file, "-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY").unwrap();
        writeln!(file, "-122.22,37.86,21.0,7099.0,,2401.0,1138.0,8.3014,358500.0,NEAR BAY").unwrap();

        let records = load_housing(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_bedrooms, Some(129.0));
        assert_eq!(records[1].total_bedrooms, None);
        assert_eq!(records[1].ocean_proximity, "NEAR BAY");
    }
}
