//! rootscan command line tool.

use anyhow::Result;
use colored::Colorize;
use log::{error, warn};
use rootscan_core::{
    analyze, cli::generate_cli, initialize_config, initialize_logger, Reporter,
};
use std::process::exit;

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        for cause in e.chain().skip(1) {
            error!("\tCaused by: {}", cause);
        }
        exit(1);
    }
}

fn run() -> Result<()> {
    let cli = generate_cli().get_matches();

    let config = match initialize_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            initialize_logger(cli.is_present("verbose"), cli.is_present("quiet"));
            return Err(e);
        }
    };
    initialize_logger(config.is_verbose(), config.is_quiet());
    if config.file().is_none() {
        warn!("Config file not found. Using default configuration");
    }

    let results = analyze(&config, &Reporter::stdout())?;

    if config.is_bench() {
        println!();
        println!("{}", "Benchmarks:".bold());
        for benchmark in results.benchmarks() {
            println!("{}", benchmark);
        }
    }

    Ok(())
}
