//! Invocation pass: finds references to the methods flagged by the detection pass.
//!
//! This is a textual heuristic, not a control flow analysis. Any verbatim occurrence of a
//! callable identifier is reported as a call, including occurrences inside string literals.

use super::read_source;
use crate::{
    matcher::{Matcher, SignatureSet},
    results::CallEdge,
    smali::{CallableId, CallableNamer, Methods, Resolution},
};
use anyhow::Result;
use std::path::Path;

/// Call site search over single files.
#[derive(Debug)]
pub struct InvocationPass {
    matcher: Matcher,
    namer: CallableNamer,
    resolution: Resolution,
}

impl InvocationPass {
    /// Creates the pass searching for the given callable identifiers.
    pub fn new<'i, I>(callables: I, namer: CallableNamer, resolution: Resolution) -> Result<Self>
    where
        I: IntoIterator<Item = &'i CallableId>,
    {
        let signatures = SignatureSet::new(callables.into_iter().map(CallableId::to_string));
        Ok(Self {
            matcher: Matcher::new(signatures)?,
            namer,
            resolution,
        })
    }

    /// Scans the code of one file.
    ///
    /// References to methods of the class named after the file's path are skipped. In an
    /// apktool tree each class lives in its own file, so this skips exactly the references
    /// made from the file that defines the method.
    pub fn scan(&self, path: &Path, code: &str) -> Vec<CallEdge> {
        let matches = self.matcher.find_all(code);
        if matches.is_empty() {
            return Vec::new();
        }

        let own_class = self.namer.class_prefix(path);
        let methods = Methods::extract(code);
        matches
            .into_iter()
            .filter(|m| !m.signature().starts_with(own_class.as_str()))
            .map(|m| {
                let method = methods
                    .resolve(code, self.resolution, m.start(), m.signature())
                    .map(|region| region.signature(code).to_owned());

                CallEdge::new(path, method, CallableId::new(m.signature()))
            })
            .collect()
    }

    /// Reads and scans one file.
    pub fn scan_file(&self, path: &Path) -> Result<Vec<CallEdge>> {
        let code = read_source(path)?;
        Ok(self.scan(path, &code))
    }
}
