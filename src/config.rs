//! Configuration module.
//!
//! Handles and configures the initial settings and variables needed to run the scanner. The
//! configuration is read from a TOML file, where every field is optional, and then decorated
//! with the command line options.

use crate::{error::Kind, matcher::SignatureSet, smali::Resolution, DEFAULT_SIGNATURES};
use anyhow::{Context, Result};
use clap::ArgMatches;
use regex::Regex;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// Default expression for the path prefix that is not part of a class name.
const DEFAULT_CLASS_ROOT: &str = r"^smali(?:_[^/]+)?/";

/// Scanner configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    root: PathBuf,
    threads: usize,
    extension: String,
    #[serde(deserialize_with = "deserialize_class_root")]
    class_root: Regex,
    signatures: Vec<String>,
    resolution: Resolution,
    json_report: Option<PathBuf>,
    verbose: bool,
    quiet: bool,
    bench: bool,
    #[serde(skip)]
    file: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration from the given TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let toml = fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml(&toml)?;
        config.file = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Parses a TOML configuration.
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| {
            Kind::Config {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Modifies the options from the CLI.
    pub fn decorate_with_cli(&mut self, cli: &ArgMatches<'_>) -> Result<()> {
        // The positional root always has a default value, so it only overrides the file
        // setting when given explicitly.
        if cli.occurrences_of("root") > 0 {
            if let Some(root) = cli.value_of("root") {
                self.root = PathBuf::from(root);
            }
        }

        if let Some(threads) = cli.value_of("threads") {
            self.threads = threads.parse().map_err(|_| Kind::Config {
                message: format!(
                    "the number of threads must be a positive integer, got `{}`",
                    threads
                ),
            })?;
        }

        if let Some(extension) = cli.value_of("extension") {
            self.extension = extension.trim_start_matches('.').to_owned();
        }

        if let Some(path) = cli.value_of("signatures") {
            self.signatures = load_signatures(path)?;
        }

        if let Some(path) = cli.value_of("json") {
            self.json_report = Some(PathBuf::from(path));
        }

        self.verbose = self.verbose || cli.is_present("verbose");
        self.quiet = self.quiet || cli.is_present("quiet");
        self.bench = self.bench || cli.is_present("bench");
        if self.verbose {
            self.quiet = false;
        }

        Ok(())
    }

    /// Gets the list of problems of the current configuration.
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.threads == 0 {
            errors.push("the number of threads must be at least 1".to_owned());
        }
        if self.extension.is_empty() {
            errors.push("the source file extension must not be empty".to_owned());
        }
        if self.signatures.iter().all(String::is_empty) {
            errors.push("at least one non-empty root detection string is needed".to_owned());
        }
        errors
    }

    /// Checks that the configuration is usable.
    pub fn check(&self) -> Result<()> {
        let errors = self.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Kind::Config {
                message: errors.join(", "),
            }
            .into())
        }
    }

    /// Gets the directory to scan.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sets the directory to scan.
    pub fn set_root<P: Into<PathBuf>>(&mut self, root: P) {
        self.root = root.into();
    }

    /// Gets the number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Sets the number of worker threads.
    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads;
    }

    /// Gets the source file extension, without the dot.
    pub fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Gets the expression matching the non-class prefix of relative paths.
    pub fn class_root(&self) -> &Regex {
        &self.class_root
    }

    /// Gets the root detection signatures.
    pub fn signatures(&self) -> SignatureSet {
        SignatureSet::new(self.signatures.iter().cloned())
    }

    /// Sets the root detection signatures.
    pub fn set_signatures<I, S>(&mut self, signatures: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signatures = signatures.into_iter().map(Into::into).collect();
    }

    /// Gets how matches are resolved to their method.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Sets how matches are resolved to their method.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// Gets the path of the JSON report, if one has to be generated.
    pub fn json_report(&self) -> Option<&Path> {
        self.json_report.as_deref()
    }

    /// Sets the path of the JSON report.
    pub fn set_json_report<P: Into<PathBuf>>(&mut self, path: P) {
        self.json_report = Some(path.into());
    }

    /// Returns true if the scanner is running in verbose mode.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Returns true if the scanner is running in quiet mode.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Gets the file the configuration was loaded from, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Returns true if the scanner is running in benchmark mode.
    pub fn is_bench(&self) -> bool {
        self.bench
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            threads: num_cpus::get(),
            extension: "smali".to_owned(),
            class_root: Regex::new(DEFAULT_CLASS_ROOT).expect("default class root is valid"),
            signatures: DEFAULT_SIGNATURES.iter().map(|s| (*s).to_owned()).collect(),
            resolution: Resolution::default(),
            json_report: None,
            verbose: false,
            quiet: false,
            bench: false,
            file: None,
        }
    }
}

/// Loads a list of root detection strings from a JSON array file.
pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let f = fs::File::open(path.as_ref()).with_context(|| {
        format!(
            "could not open the signatures file {}",
            path.as_ref().display()
        )
    })?;
    let signatures: Vec<String> = serde_json::from_reader(f).with_context(|| {
        format!(
            "the signatures file {} must be a JSON array of strings",
            path.as_ref().display()
        )
    })?;
    Ok(signatures)
}

/// Regular expression serde visitor.
struct RegexVisitor;

impl<'de> Visitor<'de> for RegexVisitor {
    type Value = Regex;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a valid regular expression")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Regex::new(value).map_err(E::custom)
    }
}

/// Deserializes the class root regular expression.
fn deserialize_class_root<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_str(RegexVisitor)
}
