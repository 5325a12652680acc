//! Common routines for handling input data.
use crate::factory::Factory;
use crate::scenario::Scenario;
use anyhow::{Context, Result};
use log::info;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod factory;
use factory::read_factory;
pub mod scenario;
use scenario::read_scenario;

/// The file describing the components and connections of a factory
pub const FACTORY_FILE_NAME: &str = "factory.toml";

/// The file describing the scenario the factory is simulated under
pub const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// Optional file holding extra scenario time series, one per column
pub const TIMESERIES_FILE_NAME: &str = "timeseries.csv";

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    let toml_data = toml::from_str(&toml_str)
        .with_context(|| format!("Could not parse {}", file_path.display()))?;

    Ok(toml_data)
}

/// Load a factory and its scenario from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The factory and the scenario, or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<(Factory, Scenario)> {
    let model_dir = model_dir.as_ref();
    let factory = read_factory(model_dir)?;
    let scenario = read_scenario(model_dir)?;
    info!(
        "Loaded factory {} with {} components and scenario {}",
        factory.name,
        factory.user_component_count(),
        scenario.name
    );

    Ok((factory, scenario))
}
