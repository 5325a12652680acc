//! Logging for factopt.
//!
//! Messages are written to the terminal: warnings and errors to stderr, everything else to stdout.
//! Runs which write results also keep a copy of the messages in `factopt.log` in the output
//! directory. The level is taken from the `FACTOPT_LOG_LEVEL` environment variable, then from
//! `settings.toml`, and is `info` otherwise.
use anyhow::{Result, anyhow, bail};
use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::{Level, LevelFilter};
use std::env;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Environment variable which overrides the log level in the settings
const LOG_LEVEL_VAR: &str = "FACTOPT_LOG_LEVEL";

/// Log level used when neither the environment nor the settings give one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the log file written to the output directory
const LOG_FILE_NAME: &str = "factopt.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Install the program logger.
///
/// Accepted levels are `off`, `error`, `warn`, `info`, `debug` and `trace`, in any case.
///
/// # Arguments
///
/// * `log_level_from_settings` - The `log_level` of `settings.toml`, if any
/// * `log_file_dir` - Directory for `factopt.log`, if a log file should be kept
pub fn init(log_level_from_settings: Option<&str>, log_file_dir: Option<&Path>) -> Result<()> {
    let level = match env::var(LOG_LEVEL_VAR) {
        Ok(level) => parse_log_level(&level)?,
        Err(_) => parse_log_level(log_level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL))?,
    };

    // Only warnings and errors are highlighted
    let colours = std::io::stderr().is_terminal().then(|| {
        ColoredLevelConfig::new()
            .error(Color::Red)
            .warn(Color::Yellow)
    });

    let mut dispatch = Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > Level::Warn)
                .format(|out, message, record| {
                    out.finish(format_args!("[{} {}] {message}", clock(), record.level()));
                })
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    let level = record.level();
                    match &colours {
                        Some(colours) => out.finish(format_args!(
                            "[{} {}] {message}",
                            clock(),
                            colours.color(level)
                        )),
                        None => out.finish(format_args!("[{} {level}] {message}", clock())),
                    }
                })
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    // The file always records at least the progress of the run
    if let Some(dir) = log_file_dir {
        let file = File::create(dir.join(LOG_FILE_NAME))?;
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} {:<5} {}: {message}",
                        Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target()
                    ));
                })
                .level(level.max(LevelFilter::Info))
                .chain(file),
        );
    }

    dispatch
        .apply()
        .map_err(|_| anyhow!("Logger already initialised"))?;
    LOGGER_INIT
        .set(())
        .map_err(|()| anyhow!("Logger already initialised"))
}

fn clock() -> impl std::fmt::Display {
    Local::now().format("%H:%M:%S")
}

/// Convert a log level name to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}
