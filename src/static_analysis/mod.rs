//! Static analysis of the decoded smali code.
//!
//! The analysis runs two passes over the same files. The detection pass looks for root
//! detection strings and records the methods containing them. Once it has fully drained, the
//! invocation pass looks for references to those methods in the rest of the code.

pub mod coordinator;
pub mod detection;
pub mod invocation;
#[cfg(test)]
mod tests;

use self::{coordinator::Coordinator, detection::DetectionPass, invocation::InvocationPass};
use crate::{
    results::{Benchmark, Finding, Reporter, Results},
    smali::CallableNamer,
    Config,
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::{
    collections::BTreeSet,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

/// Runs both passes over the given files, reporting every record as it is found.
pub fn static_analysis(config: &Config, files: &[PathBuf], reporter: &Reporter) -> Result<Results> {
    let namer = CallableNamer::new(config.root(), config.class_root().clone(), config.extension());
    let mut coordinator = Coordinator::new(config.threads());

    info!("Searching files for strings that are commonly used for root detection...");
    let detection_start = Instant::now();
    let detection = DetectionPass::new(config.signatures(), namer.clone(), config.resolution())?;
    let findings = Mutex::new(Vec::new());
    let callable_ids = Mutex::new(BTreeSet::new());

    let stats = coordinator.run("detection pass", files, |path| {
        let file_findings = detection.scan_file(path)?;
        {
            let mut ids = lock(&callable_ids);
            for id in file_findings.iter().filter_map(Finding::callable) {
                let _ = ids.insert(id.clone());
            }
        }
        report_all(reporter, path, &file_findings);
        lock(&findings).extend(file_findings);
        Ok(())
    });

    let findings = findings.into_inner().unwrap_or_else(PoisonError::into_inner);
    let callable_ids = callable_ids
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let detection_time = detection_start.elapsed();
    debug!(
        "Detection pass done: {} files, {} failed.",
        stats.processed(),
        stats.failed()
    );
    info!(
        "Found {} root detection strings in {} methods.",
        findings.len(),
        callable_ids.len()
    );

    let invocation_start = Instant::now();
    let call_edges = if callable_ids.is_empty() {
        debug!("No detecting methods were found, skipping the invocation pass.");
        Vec::new()
    } else {
        info!(
            "Searching files for calls to the {} detecting methods...",
            callable_ids.len()
        );
        // The identifier set is read-only from here on, so workers share it without locking.
        let invocation = InvocationPass::new(&callable_ids, namer, config.resolution())?;
        let call_edges = Mutex::new(Vec::new());

        let stats = coordinator.run("invocation pass", files, |path| {
            let file_edges = invocation.scan_file(path)?;
            report_all(reporter, path, &file_edges);
            lock(&call_edges).extend(file_edges);
            Ok(())
        });
        debug!(
            "Invocation pass done: {} files, {} failed.",
            stats.processed(),
            stats.failed()
        );

        let call_edges = call_edges
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        info!("Found {} calls to detecting methods.", call_edges.len());
        call_edges
    };
    let invocation_time = invocation_start.elapsed();

    let mut results = Results::new(findings, callable_ids, call_edges);
    results.add_benchmark(Benchmark::new("Detection pass", detection_time));
    results.add_benchmark(Benchmark::new("Invocation pass", invocation_time));
    Ok(results)
}

/// Reads a source file, replacing invalid UTF-8 sequences.
fn read_source(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("could not read `{}`", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes the records of one file to the reporter.
///
/// A failing sink only loses output: the records are collected by the caller either way.
fn report_all<D: Display>(reporter: &Reporter, path: &Path, records: &[D]) {
    for record in records {
        if let Err(e) = reporter.report(record) {
            warn!(
                "could not write the results of `{}`. Error: {}",
                path.display(),
                e
            );
            break;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
