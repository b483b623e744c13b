//! Scan results.

mod report;
pub(crate) mod reporter;

pub use self::reporter::Reporter;

use crate::smali::CallableId;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

/// Root detection string found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Finding {
    file: PathBuf,
    method: Option<String>,
    matched: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callable: Option<CallableId>,
}

impl Finding {
    /// Creates a new finding.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(
        file: P,
        method: Option<String>,
        matched: S,
        callable: Option<CallableId>,
    ) -> Self {
        Self {
            file: file.into(),
            method,
            matched: matched.into(),
            callable,
        }
    }

    /// File where the string was found.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Signature line of the enclosing method, if the match was inside one.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The root detection string that matched.
    pub fn matched(&self) -> &str {
        self.matched.as_str()
    }

    /// Identifier of the enclosing method, used to find its callers.
    pub fn callable(&self) -> Option<&CallableId> {
        self.callable.as_ref()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.file.display(),
            self.method().unwrap_or(""),
            self.matched
        )
    }
}

/// Reference to a detecting method found in a source file.
///
/// This is a textual co-occurrence, not a resolved call: a string literal that happens to
/// contain a callable identifier is reported as well.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CallEdge {
    file: PathBuf,
    method: Option<String>,
    callee: CallableId,
}

impl CallEdge {
    /// Creates a new call edge.
    pub fn new<P: Into<PathBuf>>(file: P, method: Option<String>, callee: CallableId) -> Self {
        Self {
            file: file.into(),
            method,
            callee,
        }
    }

    /// File containing the call site.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Signature line of the method containing the call site.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The referenced detecting method.
    pub fn callee(&self) -> &CallableId {
        &self.callee
    }
}

impl fmt::Display for CallEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call to {} found", self.callee)?;
        writeln!(f, "    file: {}", self.file.display())?;
        write!(f, "    method: {}", self.method().unwrap_or(""))
    }
}

/// Benchmark of one step of the scan.
#[derive(Debug, Clone)]
pub struct Benchmark {
    label: String,
    duration: Duration,
}

impl Benchmark {
    /// Creates a new benchmark.
    pub fn new<S: Into<String>>(label: S, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}.{:03}s",
            self.label,
            self.duration.as_secs(),
            self.duration.subsec_millis()
        )
    }
}

/// Results of a full scan.
#[derive(Debug, Default, Serialize)]
pub struct Results {
    findings: Vec<Finding>,
    call_edges: Vec<CallEdge>,
    callable_ids: BTreeSet<CallableId>,
    #[serde(skip)]
    benchmarks: Vec<Benchmark>,
}

impl Results {
    /// Creates the results from the output of both passes.
    pub fn new(
        findings: Vec<Finding>,
        callable_ids: BTreeSet<CallableId>,
        call_edges: Vec<CallEdge>,
    ) -> Self {
        Self {
            findings,
            call_edges,
            callable_ids,
            benchmarks: Vec::new(),
        }
    }

    /// Root detection findings.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Calls to the detecting methods.
    pub fn call_edges(&self) -> &[CallEdge] {
        &self.call_edges
    }

    /// Identifiers of every method with a finding.
    pub fn callable_ids(&self) -> &BTreeSet<CallableId> {
        &self.callable_ids
    }

    /// Adds a benchmark.
    pub fn add_benchmark(&mut self, benchmark: Benchmark) {
        self.benchmarks.push(benchmark);
    }

    /// Benchmarks recorded during the scan.
    pub fn benchmarks(&self) -> &[Benchmark] {
        &self.benchmarks
    }

    /// Sorts findings and call edges so that the results no longer depend on scheduling.
    pub fn sort(&mut self) {
        self.findings.sort();
        self.call_edges.sort();
    }

    /// Writes the JSON report to the given path.
    pub fn generate_report<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        report::write_json(self, path.as_ref()).with_context(|| {
            format!(
                "there was an error generating the JSON report at {}",
                path.as_ref().display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Benchmark, CallEdge, Finding, Results};
    use std::{collections::BTreeSet, time::Duration};

    #[test]
    fn it_formats_findings() {
        let finding = Finding::new(
            "smali/a/B.smali",
            Some(".method public static isRooted()Z".to_owned()),
            "/system/bin/su",
            None,
        );
        assert_eq!(
            finding.to_string(),
            "smali/a/B.smali, .method public static isRooted()Z, /system/bin/su"
        );

        let finding = Finding::new("smali/a/B.smali", None, "test-keys", None);
        assert_eq!(finding.to_string(), "smali/a/B.smali, , test-keys");
    }

    #[test]
    fn it_formats_call_edges() {
        let namer = crate::smali::CallableNamer::new(
            "",
            regex::Regex::new("^smali/").unwrap(),
            "smali",
        );
        let callee = namer
            .callable_id("smali/foo.smali", ".method public bar()V")
            .unwrap();
        let edge = CallEdge::new(
            "smali/baz.smali",
            Some(".method public baz()V".to_owned()),
            callee,
        );
        assert_eq!(
            edge.to_string(),
            "Call to Lfoo;->bar( found\n    file: smali/baz.smali\n    method: .method public baz()V"
        );
    }

    #[test]
    fn it_formats_benchmarks() {
        let benchmark = Benchmark::new("Detection pass", Duration::from_millis(1_234));
        assert_eq!(benchmark.to_string(), "Detection pass: 1.234s");
    }

    #[test]
    fn it_sorts_results() {
        let mut results = Results::new(
            vec![
                Finding::new("b.smali", None, "test-keys", None),
                Finding::new("a.smali", None, "test-keys", None),
            ],
            BTreeSet::new(),
            Vec::new(),
        );
        results.sort();
        let files: Vec<_> = results.findings().iter().map(Finding::file).collect();
        assert_eq!(
            files,
            vec![std::path::Path::new("a.smali"), std::path::Path::new("b.smali")]
        );
    }
}
