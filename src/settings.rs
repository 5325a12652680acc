//! Code for loading program settings.
use crate::get_factopt_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use crate::simulation::SolverOptions;
use anyhow::Result;
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for factopt
# Uncomment a setting to change it from its default value
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_solver_method() -> String {
    SolverOptions::default().solver_method
}

fn default_result_epsilon() -> f64 {
    SolverOptions::default().result_epsilon
}

fn default_result_decimals() -> u32 {
    SolverOptions::default().result_decimals
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_factopt_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// Whether to write the graph of the factory alongside the results
    #[serde(default)]
    pub debug_model: bool,
    /// Time limit for the solver in seconds
    #[serde(default)]
    pub max_solver_time: Option<f64>,
    /// Algorithm used by the solver ("choose", "simplex" or "ipm")
    #[serde(default = "default_solver_method")]
    pub solver_method: String,
    /// Optimality tolerance of the interior point method
    #[serde(default)]
    pub barrier_tolerance: Option<f64>,
    /// Relative gap at which the search for an integer solution stops
    #[serde(default)]
    pub mip_gap: Option<f64>,
    /// Whether to show the output of the solver
    #[serde(default)]
    pub log_solver: bool,
    /// Results closer to zero than this are reported as zero
    #[serde(default = "default_result_epsilon")]
    pub result_epsilon: f64,
    /// Number of decimal places results are rounded to
    #[serde(default = "default_result_decimals")]
    pub result_decimals: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            debug_model: false,
            max_solver_time: None,
            solver_method: default_solver_method(),
            barrier_tolerance: None,
            mip_gap: None,
            log_solver: false,
            result_epsilon: default_result_epsilon(),
            result_decimals: default_result_decimals(),
        }
    }
}

impl Settings {
    /// Read the contents of the settings file.
    ///
    /// If the file is not present, default values for settings will be used
    ///
    /// # Returns
    ///
    /// The program settings as a `Settings` struct or an error if the file is invalid
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, falling back to defaults if there is no file
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// The options passed on to the solver
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            max_solver_time: self.max_solver_time,
            solver_method: self.solver_method.clone(),
            barrier_tolerance: self.barrier_tolerance,
            mip_gap: self.mip_gap,
            log_solver: self.log_solver,
            result_epsilon: self.result_epsilon,
            result_decimals: self.result_decimals,
        }
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        // Settings object with default values set by serde
        let settings: Settings =
            toml::from_str("").expect("Cannot create settings from empty TOML file");

        // Convert to TOML. Settings without a default value are left out.
        let settings_raw = toml::to_string(&settings).expect("Could not convert settings to TOML");

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.split('\n') {
            if let Some(last) = line.find('=') {
                let field = line[..last].trim();

                // All fields should have doc comments
                let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}
