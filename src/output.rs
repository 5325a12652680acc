//! The module responsible for writing output data to disk.
use crate::component::ComponentType;
use crate::graph::factory_to_dot;
use crate::id::{ComponentID, FlowTypeID};
use crate::simulation::results::Results;
use crate::simulation::{Anomaly, Simulation};
use anyhow::{Context, Result, ensure};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;
use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "factopt_results";

/// The output file name for connection flows
const CONNECTION_FLOWS_FILE_NAME: &str = "connection_flows.csv";

/// The output file name for component results
const COMPONENT_RESULTS_FILE_NAME: &str = "component_results.csv";

/// The output file name for the summary of the results
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for anomalies found in the results
const ANOMALIES_FILE_NAME: &str = "anomalies.csv";

/// The output file name for the graph of the factory
const FACTORY_GRAPH_FILE_NAME: &str = "factory.dot";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// An existing directory is only reused if it is empty or `allow_overwrite` is set.
///
/// # Returns
///
/// Whether the contents of an existing directory will be overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if output_dir.is_dir() {
        let is_empty = output_dir.read_dir()?.next().is_none();
        if is_empty {
            return Ok(false);
        }
        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace its \
             contents."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the connection flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ConnectionFlowRow {
    connection: String,
    origin: ComponentID,
    destination: ComponentID,
    flowtype: FlowTypeID,
    timestep: usize,
    flow: f64,
}

/// Represents a row in the component results CSV file.
///
/// Scalar results have no timestep.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ComponentResultRow {
    component: ComponentID,
    component_type: ComponentType,
    variable: String,
    timestep: Option<usize>,
    value: f64,
}

/// Represents a row in the summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    name: String,
    value: f64,
}

/// An object for writing the results of a simulation to file
pub struct DataWriter {
    flows_writer: csv::Writer<File>,
    components_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
    anomalies_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            flows_writer: new_writer(CONNECTION_FLOWS_FILE_NAME)?,
            components_writer: new_writer(COMPONENT_RESULTS_FILE_NAME)?,
            summary_writer: new_writer(SUMMARY_FILE_NAME)?,
            anomalies_writer: new_writer(ANOMALIES_FILE_NAME)?,
        })
    }

    /// Write the flow through every connection at every timestep
    pub fn write_flows(&mut self, results: &Results) -> Result<()> {
        for connection in results.connections.values() {
            for (timestep, flow) in connection.flow.iter().enumerate() {
                let row = ConnectionFlowRow {
                    connection: connection.name.clone(),
                    origin: connection.origin.clone(),
                    destination: connection.destination.clone(),
                    flowtype: connection.flowtype.clone(),
                    timestep,
                    flow: *flow,
                };
                self.flows_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Write the time series and scalar results of every component
    pub fn write_components(&mut self, results: &Results) -> Result<()> {
        for (key, result) in &results.components {
            let component_type = result.component_type();
            for (variable, series) in result.series() {
                for (timestep, value) in series.iter().enumerate() {
                    let row = ComponentResultRow {
                        component: key.clone(),
                        component_type,
                        variable: variable.clone(),
                        timestep: Some(timestep),
                        value: *value,
                    };
                    self.components_writer.serialize(row)?;
                }
            }
            for (variable, value) in result.scalars() {
                let row = ComponentResultRow {
                    component: key.clone(),
                    component_type,
                    variable: variable.to_string(),
                    timestep: None,
                    value,
                };
                self.components_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Write the factory-wide results
    pub fn write_summary(&mut self, results: &Results) -> Result<()> {
        for (name, value) in [
            ("objective", results.objective),
            ("total_emissions", results.total_emissions),
            ("total_emission_cost", results.total_emission_cost),
            ("self_sufficiency", results.self_sufficiency),
            ("onsite_energy", results.onsite_energy),
            ("offsite_energy", results.offsite_energy),
            ("onsite_consumption", results.onsite_consumption),
            ("offsite_consumption", results.offsite_consumption),
        ] {
            let row = SummaryRow {
                name: name.to_string(),
                value,
            };
            self.summary_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the anomalies found in the results
    pub fn write_anomalies(&mut self, anomalies: &[Anomaly]) -> Result<()> {
        for anomaly in anomalies {
            self.anomalies_writer.serialize(anomaly)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.flows_writer.flush()?;
        self.components_writer.flush()?;
        self.summary_writer.flush()?;
        self.anomalies_writer.flush()?;

        Ok(())
    }
}

/// Write the outcome of a simulation to the output folder.
///
/// Metadata is always written. The CSV files are only written if the simulation was solved.
///
/// # Arguments
///
/// * `output_path` - Folder where files will be saved
/// * `model_path` - Folder the model was loaded from
/// * `simulation` - The simulation, after it has been run
/// * `debug_model` - Whether to also write the graph of the factory
pub fn write_simulation(
    output_path: &Path,
    model_path: &Path,
    simulation: &Simulation,
    debug_model: bool,
) -> Result<()> {
    write_metadata(output_path, model_path, simulation)
        .context("Failed to save metadata.")?;

    if debug_model {
        let file_path = output_path.join(FACTORY_GRAPH_FILE_NAME);
        fs::write(&file_path, factory_to_dot(&simulation.factory))
            .with_context(|| format!("Could not write {}", file_path.display()))?;
    }

    let Some(results) = &simulation.results else {
        return Ok(());
    };

    let mut writer = DataWriter::create(output_path)?;
    writer.write_flows(results)?;
    writer.write_components(results)?;
    writer.write_summary(results)?;
    writer.write_anomalies(&simulation.anomalies)?;
    writer.flush()?;
    info!("Results written to {}", output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{grid_factory, scenario};
    use crate::factory::Factory;
    use crate::scenario::Scenario;
    use crate::simulation::SolverOptions;
    use itertools::Itertools;
    use rstest::{fixture, rstest};
    use tempfile::tempdir;

    #[fixture]
    fn results(grid_factory: Factory, scenario: Scenario) -> Results {
        let mut simulation = Simulation::new(&grid_factory, &scenario).unwrap();
        simulation.simulate(&SolverOptions::default()).unwrap();
        simulation.results.unwrap()
    }

    fn read_rows<T: for<'de> Deserialize<'de>>(file_path: &Path) -> Vec<T> {
        csv::Reader::from_path(file_path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    #[test]
    fn test_create_output_directory_new() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_not_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), "").unwrap();
        assert!(create_output_directory(dir.path(), false).is_err());
        assert!(create_output_directory(dir.path(), true).unwrap());
        assert!(!dir.path().join("file.txt").exists());
    }

    #[rstest]
    fn test_write_flows(results: Results) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_flows(&results).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<ConnectionFlowRow> =
            read_rows(&dir.path().join(CONNECTION_FLOWS_FILE_NAME));
        // Two connections over three timesteps
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|row| row.flow == 5.0));
        assert_eq!(rows[0].origin, "grid".into());
    }

    #[rstest]
    fn test_write_components(results: Results) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_components(&results).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<ComponentResultRow> =
            read_rows(&dir.path().join(COMPONENT_RESULTS_FILE_NAME));
        let grid_cost = rows
            .iter()
            .find(|row| row.component == "grid".into() && row.variable == "cost")
            .unwrap();
        assert_eq!(grid_cost.component_type, ComponentType::Source);
        assert_eq!(grid_cost.timestep, None);
        assert_eq!(grid_cost.value, 30.0);
    }

    #[rstest]
    fn test_write_summary(results: Results) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_summary(&results).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<SummaryRow> = read_rows(&dir.path().join(SUMMARY_FILE_NAME));
        assert_eq!(
            rows[0],
            SummaryRow {
                name: "objective".into(),
                value: 30.0
            }
        );
    }
}
