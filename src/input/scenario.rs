//! Code for reading a scenario from `scenario.toml` and `timeseries.csv`.
use super::{SCENARIO_FILE_NAME, TIMESERIES_FILE_NAME, read_toml};
use crate::parameter::Series;
use crate::scenario::Scenario;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const fn default_timefactor() -> f64 {
    1.0
}

/// The contents of `scenario.toml`
#[derive(Debug, Deserialize, PartialEq)]
struct ScenarioFile {
    name: String,
    number_of_timesteps: usize,
    #[serde(default = "default_timefactor")]
    timefactor: f64,
    #[serde(default)]
    scalars: IndexMap<String, f64>,
    #[serde(default)]
    timeseries: IndexMap<String, Series>,
}

/// Read a scenario from the specified model directory.
///
/// Time series may be given in `scenario.toml` or as columns of an optional `timeseries.csv`,
/// but a name may only be used once.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_scenario(model_dir: &Path) -> Result<Scenario> {
    let file_path = model_dir.join(SCENARIO_FILE_NAME);
    let raw: ScenarioFile = read_toml(&file_path)?;
    let mut scenario = Scenario::new(&raw.name, raw.number_of_timesteps, raw.timefactor)
        .with_context(|| format!("Invalid scenario in {}", file_path.display()))?;
    scenario.scalars = raw.scalars;
    scenario.timeseries = raw.timeseries;

    let csv_path = model_dir.join(TIMESERIES_FILE_NAME);
    if csv_path.is_file() {
        for (name, series) in read_timeseries_csv(&csv_path)? {
            ensure!(
                !scenario.timeseries.contains_key(&name),
                "Time series {name} is defined in both {} and {}",
                SCENARIO_FILE_NAME,
                TIMESERIES_FILE_NAME
            );
            scenario.timeseries.insert(name, series);
        }
    }

    Ok(scenario)
}

/// Read time series from a CSV file with one named column per series
fn read_timeseries_csv(file_path: &Path) -> Result<IndexMap<String, Series>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    let names: Vec<String> = reader
        .headers()
        .with_context(|| format!("Could not read header of {}", file_path.display()))?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut columns = vec![Series::new(); names.len()];
    for (row, record) in reader.deserialize::<Vec<f64>>().enumerate() {
        let record = record.with_context(|| {
            format!("Invalid value in row {} of {}", row + 1, file_path.display())
        })?;
        for (column, value) in columns.iter_mut().zip(record) {
            column.push(value);
        }
    }

    Ok(names.into_iter().zip(columns).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SCENARIO_TOML: &str = r#"
name = "winter"
number_of_timesteps = 3
timefactor = 0.5

[scalars]
cost_co2_per_kg = 0.1

[timeseries]
price = [1, 2, 3]
"#;

    #[test]
    fn test_read_scenario() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SCENARIO_FILE_NAME), SCENARIO_TOML).unwrap();
        fs::write(
            dir.path().join(TIMESERIES_FILE_NAME),
            "demand,ambient\n1.0,10\n2.0,11\n3.0,12\n",
        )
        .unwrap();

        let scenario = read_scenario(dir.path()).unwrap();
        assert_eq!(scenario.name, "winter");
        assert_eq!(scenario.number_of_timesteps, 3);
        assert_eq!(scenario.timefactor, 0.5);
        assert_eq!(scenario.co2_price(), 0.1);
        assert_eq!(scenario.timeseries["price"], [1.0, 2.0, 3.0]);
        assert_eq!(scenario.timeseries["demand"], [1.0, 2.0, 3.0]);
        assert_eq!(scenario.timeseries["ambient"], [10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_read_scenario_duplicate_series() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SCENARIO_FILE_NAME), SCENARIO_TOML).unwrap();
        fs::write(dir.path().join(TIMESERIES_FILE_NAME), "price\n1\n2\n3\n").unwrap();

        assert!(read_scenario(dir.path()).is_err());
    }

    #[test]
    fn test_read_scenario_no_timesteps() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SCENARIO_FILE_NAME),
            "name = \"empty\"\nnumber_of_timesteps = 0\n",
        )
        .unwrap();

        assert!(read_scenario(dir.path()).is_err());
    }
}
