//! Detection pass: finds root detection strings and the methods containing them.

use super::read_source;
use crate::{
    matcher::{Matcher, SignatureSet},
    results::Finding,
    smali::{CallableNamer, Methods, Resolution},
};
use anyhow::Result;
use std::path::Path;

/// Root detection string search over single files.
#[derive(Debug)]
pub struct DetectionPass {
    matcher: Matcher,
    namer: CallableNamer,
    resolution: Resolution,
}

impl DetectionPass {
    /// Creates the pass for the given root detection signatures.
    pub fn new(
        signatures: SignatureSet,
        namer: CallableNamer,
        resolution: Resolution,
    ) -> Result<Self> {
        Ok(Self {
            matcher: Matcher::new(signatures)?,
            namer,
            resolution,
        })
    }

    /// Scans the code of one file.
    ///
    /// Every match gives a finding. Matches outside any method give a finding without method
    /// or callable identifier.
    pub fn scan(&self, path: &Path, code: &str) -> Vec<Finding> {
        let matches = self.matcher.find_all(code);
        if matches.is_empty() {
            return Vec::new();
        }

        let methods = Methods::extract(code);
        matches
            .into_iter()
            .map(|m| {
                let method = methods
                    .resolve(code, self.resolution, m.start(), m.signature())
                    .map(|region| region.signature(code).to_owned());
                let callable = method
                    .as_deref()
                    .and_then(|signature| self.namer.callable_id(path, signature));

                Finding::new(path, method, m.signature(), callable)
            })
            .collect()
    }

    /// Reads and scans one file.
    pub fn scan_file(&self, path: &Path) -> Result<Vec<Finding>> {
        let code = read_source(path)?;
        Ok(self.scan(path, &code))
    }
}
