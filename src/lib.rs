//! rootscan: root detection tracing for apktool-decoded Android applications.
//!
//! The scanner searches every smali file of a decoded application for strings commonly used to
//! detect rooted devices, reports the method containing each of them, and then looks for the
//! places where those methods are referenced.

#![forbid(anonymous_parameters, unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

/// Command Line Interface.
pub mod cli;
mod config;
mod error;
pub mod locator;
pub mod matcher;
pub mod results;
pub mod smali;
pub mod static_analysis;

pub use crate::{
    config::{load_signatures, Config},
    error::Kind,
    matcher::{Matcher, SignatureSet, DEFAULT_SIGNATURES},
    results::{Benchmark, CallEdge, Finding, Reporter, Results},
    smali::{CallableId, Resolution},
};

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use env_logger::Builder;
use log::{info, warn, Level, LevelFilter};
use std::{env, io::Write, path::PathBuf, time::Instant};

/// Initializes the config with the config files and command line options.
///
/// A file given with `--config` is always used. Otherwise, on UNIX, if the local file
/// (`config.toml`) does not exist but the global one does (`/etc/rootscan/config.toml`), the
/// latter is used. Otherwise the local file is used. If none of the files exist, the default
/// config is used, and [`Config::file`] returns `None`.
pub fn initialize_config(cli: &ArgMatches<'_>) -> Result<Config> {
    let config_path = PathBuf::from("config.toml");
    let global_config_path = PathBuf::from("/etc/rootscan/config.toml");

    let mut config = if let Some(path) = cli.value_of("config") {
        Config::from_file(path)
            .with_context(|| format!("there was an error when reading the {} file", path))?
    } else if cfg!(target_family = "unix")
        && !config_path.exists()
        && global_config_path.exists()
    {
        Config::from_file(&global_config_path).context(
            "there was an error when reading the /etc/rootscan/config.toml file",
        )?
    } else if config_path.exists() {
        Config::from_file(&config_path)
            .context("there was an error when reading the config.toml file")?
    } else {
        Config::default()
    };

    config
        .decorate_with_cli(cli)
        .context("there was an error reading config from CLI")?;
    config.check()?;

    Ok(config)
}

/// Initializes the logger.
///
/// `RUST_LOG` takes precedence over the verbosity flags when it is set.
pub fn initialize_logger(is_verbose: bool, is_quiet: bool) {
    let log_level = log_level(is_verbose, is_quiet);

    let mut builder = Builder::new();
    let _ = builder.format(|buf, record| match record.level() {
        Level::Warn => writeln!(
            buf,
            "{}{}",
            "Warning: ".bold().yellow(),
            record.args().to_string().yellow()
        ),
        Level::Error => writeln!(
            buf,
            "{}{}",
            "Error: ".bold().red(),
            record.args().to_string().red()
        ),
        Level::Debug => writeln!(
            buf,
            "{}{}",
            "Debug: ".bold(),
            record.args().to_string().bold()
        ),
        Level::Info => writeln!(buf, "{}", record.args()),
        Level::Trace => writeln!(buf, "{}: {}", record.level(), record.args()),
    });

    if let Ok(env_log) = env::var("RUST_LOG") {
        let _ = builder.parse_filters(&env_log);
    } else {
        let _ = builder.filter_level(log_level);
    }

    if let Err(e) = builder.try_init() {
        eprintln!("Could not initialize logger: {}", e);
    }
}

fn log_level(is_verbose: bool, is_quiet: bool) -> LevelFilter {
    if is_verbose {
        LevelFilter::Debug
    } else if is_quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

/// Scans the configured directory, writing findings and call edges to the reporter.
///
/// A directory without source files is not an error: it gives empty results.
pub fn analyze(config: &Config, reporter: &Reporter) -> Result<Results> {
    let start_time = Instant::now();

    info!("Checking for .{} files...", config.extension());
    let files = locator::find_source_files(config.root(), config.extension())?;
    let location_time = start_time.elapsed();
    let mut results = if files.is_empty() {
        warn!(
            "No .{} files found while searching recursively from {}.",
            config.extension(),
            config.root().display()
        );
        Results::default()
    } else {
        info!("Found {} .{} files.", files.len(), config.extension());
        static_analysis::static_analysis(config, &files, reporter)?
    };
    results.add_benchmark(Benchmark::new("File location", location_time));
    results.add_benchmark(Benchmark::new("Total time", start_time.elapsed()));

    if let Some(path) = config.json_report() {
        results.sort();
        results.generate_report(path)?;
        info!("JSON report written to {}.", path.display());
    }

    Ok(results)
}
