//! JSON report generation.

use super::Results;
use anyhow::Result;
use log::debug;
use std::{fs::File, io::BufWriter, path::Path};

/// Writes the results as JSON to the given file.
pub fn write_json(results: &Results, path: &Path) -> Result<()> {
    debug!("Starting JSON report generation at {}.", path.display());
    let f = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(f, results)?;
    Ok(())
}
