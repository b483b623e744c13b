//! Module containing the definition of error types.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Enumeration of the different error kinds.
#[derive(Debug, Error)]
pub enum Kind {
    /// Configuration error.
    #[error("there was an error in the configuration: {message}")]
    Config {
        /// Error message.
        message: String,
    },
    /// The directory to scan does not exist or could not be read.
    #[error("could not read the source directory `{}`", path.display())]
    SourceDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The signature automaton could not be built.
    #[error("could not build the signature matcher: {message}")]
    Matcher {
        /// Error message.
        message: String,
    },
}
