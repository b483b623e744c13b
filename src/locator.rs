//! Source file discovery.

use crate::error::Kind;
use anyhow::Result;
use log::warn;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Recursively finds every file under `root` whose name ends with `.<extension>`.
///
/// The order of the returned paths follows the filesystem enumeration order. A missing or
/// unreadable `root` is an error, while unreadable subdirectories are skipped with a warning.
pub fn find_source_files<P: AsRef<Path>, S: AsRef<str>>(
    root: P,
    extension: S,
) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let suffix = format!(".{}", extension.as_ref());
    let entries = fs::read_dir(root).map_err(|e| Kind::SourceDir {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    add_files_to_vec(entries, &suffix, &mut files);
    Ok(files)
}

fn add_files_to_vec(entries: fs::ReadDir, suffix: &str, vec: &mut Vec<PathBuf>) {
    for f in entries {
        let f = match f {
            Ok(f) => f,
            Err(e) => {
                warn!("there was an error reading a directory entry: {}", e);
                continue;
            }
        };
        let f_path = f.path();
        let f_type = match f.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!("could not get the type of `{}`: {}", f_path.display(), e);
                continue;
            }
        };

        if f_type.is_dir() {
            match fs::read_dir(&f_path) {
                Ok(sub_entries) => add_files_to_vec(sub_entries, suffix, vec),
                Err(e) => warn!(
                    "there was an error reading the directory {}: {}",
                    f_path.display(),
                    e
                ),
            }
        } else if f_path
            .file_name()
            .map_or(false, |name| name.to_string_lossy().ends_with(suffix))
        {
            vec.push(f_path);
        }
    }
}
