#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Destinations for exported scan reports and card images.
//!
//! Every write goes through a temporary sibling file that is renamed into
//! place, so a reader never observes a partially written report.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Suffix appended to the final file name while a write is in progress.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Errors raised while writing exports.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem operation failed for the given path.
    #[error("failed to write export {path}")]
    Io {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// File name hint was empty, or only dots, after sanitising.
    #[error("export name `{0}` is empty after sanitising")]
    EmptyName(String),
}

/// Destination accepting rendered report rows and image bytes.
pub trait ExportSink {
    /// Writes `rows` as newline-terminated lines and returns the final path.
    fn write_rows(&self, path_hint: &str, rows: &[String]) -> Result<PathBuf, ExportError>;

    /// Writes raw image bytes and returns the final path.
    fn write_image(&self, path_hint: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Sink writing into `<root>/<folder>/<name>`.
#[derive(Clone, Debug)]
pub struct FileSink {
    root: PathBuf,
    folder: String,
}

impl FileSink {
    /// Creates a sink rooted at `root` that writes into `folder`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, folder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            folder: folder.into(),
        }
    }

    /// Returns a sink writing into a nested folder of this one.
    #[must_use]
    pub fn nested(&self, name: &str) -> Self {
        Self {
            root: self.directory(),
            folder: sanitize_file_name(name),
        }
    }

    /// Directory every file of this sink lands in.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.root.join(sanitize_file_name(&self.folder))
    }

    fn write(&self, path_hint: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let name = sanitize_file_name(path_hint);
        if name.trim().chars().all(|ch| ch == '.') {
            return Err(ExportError::EmptyName(path_hint.to_owned()));
        }

        let directory = self.directory();
        fs::create_dir_all(&directory).map_err(|source| ExportError::Io {
            path: directory.clone(),
            source,
        })?;

        let path = directory.join(&name);
        write_bytes_atomic(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote export");
        Ok(path)
    }
}

impl ExportSink for FileSink {
    fn write_rows(&self, path_hint: &str, rows: &[String]) -> Result<PathBuf, ExportError> {
        let mut contents = String::new();
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        self.write(path_hint, contents.as_bytes())
    }

    fn write_image(&self, path_hint: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        self.write(path_hint, bytes)
    }
}

/// Replaces every character outside `[A-Za-z0-9 ._-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let tmp = temp_path(path);
    let result = fs::write(&tmp, bytes)
        .map_err(|source| ExportError::Io {
            path: tmp.clone(),
            source,
        })
        .and_then(|()| {
            fs::rename(&tmp, path).map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })
        });

    if result.is_err() && tmp.exists() {
        if let Err(error) = fs::remove_file(&tmp) {
            tracing::warn!(path = %tmp.display(), %error, "failed to remove temporary export");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitising_keeps_safe_characters() {
        assert_eq!(sanitize_file_name("abc_Country 2-1.csv"), "abc_Country 2-1.csv");
        assert_eq!(sanitize_file_name("a/b\\c:d*?"), "a_b_c_d__");
        assert_eq!(sanitize_file_name("Crème"), "Cr_me");
    }

    #[test]
    fn temp_path_keeps_the_extension() {
        let tmp = temp_path(Path::new("out/report.csv"));
        assert_eq!(tmp, Path::new("out/report.csv.tmp"));
    }
}
