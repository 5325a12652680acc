//! Code for writing metadata to file
use crate::simulation::{Simulation, SimulationState};
use anyhow::Result;
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get information about program version from git
fn get_git_hash() -> String {
    let Some(hash) = built_info::GIT_COMMIT_HASH_SHORT else {
        return "unknown".into();
    };

    if built_info::GIT_DIRTY == Some(true) {
        format!("{hash}-dirty")
    } else {
        hash.into()
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the model run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the model which was run
    model_path: &'a Path,
    /// The date and time on which the results were written
    datetime: String,
    /// Name of the factory
    factory: &'a str,
    /// Name of the scenario
    scenario: &'a str,
    /// Number of timesteps simulated
    number_of_timesteps: usize,
    /// How far the simulation got
    state: SimulationState,
    /// Whether the results passed the consistency checks
    is_valid: bool,
    /// Number of anomalies found in the results
    anomalies: usize,
}

impl<'a> RunMetadata<'a> {
    fn new(model_path: &'a Path, simulation: &'a Simulation) -> Self {
        let dt = Local::now();
        Self {
            model_path,
            datetime: dt.to_rfc2822(),
            factory: &simulation.factory.name,
            scenario: &simulation.scenario.name,
            number_of_timesteps: simulation.horizon,
            state: simulation.state,
            is_valid: simulation.is_valid,
            anomalies: simulation.anomalies.len(),
        }
    }
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
    /// The version of rustc used to compile the program
    rustc_version: &'a str,
    /// When the program was built
    build_time_utc: &'a str,
    /// The git commit hash of the build (if known)
    git_commit_hash: String,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: get_git_hash(),
        }
    }
}

/// Information about the platform on which the simulation ran.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl Default for PlatformMetadata {
    fn default() -> Self {
        let info = PlatformInfo::new().expect("Unable to determine platform info");
        Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        }
    }
}

/// Write metadata about a simulation to the specified output path in TOML format
pub fn write_metadata(
    output_path: &Path,
    model_path: &Path,
    simulation: &Simulation,
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::new(model_path, simulation),
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::default(),
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;
    use crate::fixture::{grid_factory, scenario};
    use crate::scenario::Scenario;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_write_metadata(grid_factory: Factory, scenario: Scenario) {
        let simulation = Simulation::new(&grid_factory, &scenario).unwrap();
        let dir = tempdir().unwrap();
        write_metadata(dir.path(), Path::new("model"), &simulation).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        let metadata: toml::Table = toml::from_str(&contents).unwrap();
        let run = metadata["run"].as_table().unwrap();
        assert_eq!(run["scenario"].as_str(), Some("test"));
        assert_eq!(run["state"].as_str(), Some("not_simulated"));
        assert!(metadata.contains_key("program"));
        assert!(metadata.contains_key("platform"));
    }
}
