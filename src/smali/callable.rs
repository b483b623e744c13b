//! Callable identifiers.
//!
//! A callable identifier mirrors how smali references a method, `Lcom/example/Checks;->isRooted(`,
//! so that invocations of a detected method can be found verbatim in other files.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

lazy_static! {
    /// The method name is the token right before the opening parenthesis of the descriptor.
    static ref METHOD_NAME: Regex = Regex::new(r"(?P<name>[^\s(]+)\(").unwrap();
}

/// Separator between the class descriptor and the method name.
pub const SEPARATOR: &str = ";->";

/// Identifier of a method, as it appears in smali method references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CallableId(String);

impl CallableId {
    /// Wraps an identifier read back from matched text.
    pub(crate) fn new<S: Into<String>>(id: S) -> Self {
        CallableId(id.into())
    }

    /// Gets the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for CallableId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives callable identifiers from file paths and method signatures.
#[derive(Debug, Clone)]
pub struct CallableNamer {
    root: PathBuf,
    class_root: Regex,
    extension: String,
}

impl CallableNamer {
    /// Creates a namer for files under `root`.
    ///
    /// `class_root` matches the leading part of the relative path that is not part of the class
    /// name, such as `smali/` or `smali_classes2/`.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(root: P, class_root: Regex, extension: S) -> Self {
        Self {
            root: root.into(),
            class_root,
            extension: extension.into(),
        }
    }

    /// Gets the class path of a file, `com/example/Checks` for
    /// `<root>/smali/com/example/Checks.smali`.
    pub fn class_path<P: AsRef<Path>>(&self, path: P) -> String {
        let path = path.as_ref();
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let normalized = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().replace('\\', "/")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        let stripped = self.class_root.replace(&normalized, "");
        let suffix = format!(".{}", self.extension);
        stripped
            .strip_suffix(suffix.as_str())
            .unwrap_or(&*stripped)
            .to_owned()
    }

    /// Gets the prefix shared by the identifiers of every method of a file.
    pub fn class_prefix<P: AsRef<Path>>(&self, path: P) -> String {
        format!("L{}{}", self.class_path(path), SEPARATOR)
    }

    /// Builds the identifier of the method with the given signature line.
    ///
    /// Returns `None` if no method name can be read from the line.
    pub fn callable_id<P: AsRef<Path>>(&self, path: P, signature: &str) -> Option<CallableId> {
        let name = METHOD_NAME.captures(signature)?.name("name")?.as_str();
        Some(CallableId(format!("{}{}(", self.class_prefix(path), name)))
    }
}
