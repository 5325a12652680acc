//! Common functionality for factopt, which compiles factory flow models into optimisation
//! problems and solves them.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod component;
pub mod connection;
pub mod error;
pub mod factory;
pub mod flowtype;
pub mod graph;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod parameter;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config dir for the program.
///
/// This will be something like:
///
/// * Linux: `~/.config/factopt`
/// * Windows: `C:\Users\Alice\AppData\Roaming\factopt`
/// * macOS: `/Users/Alice/Library/Application Support/factopt`
pub fn get_factopt_config_dir() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("factopt");

    dir
}
