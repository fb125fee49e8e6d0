//! Result of unpacking a package's filesystem tree to disk.

use crate::error::{InspectError, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Files unpacked by `dpkg --extract` under an extraction root.
///
/// The extraction directory belongs to the caller. Call [`verify`](Self::verify)
/// to detect files deleted since extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    package_file: PathBuf,
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl ExtractionResult {
    pub fn new(package_file: PathBuf, root: PathBuf, files: Vec<PathBuf>) -> Self {
        Self {
            package_file,
            root,
            files,
        }
    }

    /// Lists regular files and symlinks under `root`, recursively.
    ///
    /// Directories are left out. Symlinks are not followed. Files are
    /// returned in a stable, name-sorted order.
    pub fn scan(package_file: PathBuf, root: PathBuf) -> Result<Self> {
        let mut files = Vec::new();

        for dir_entry in WalkDir::new(&root).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(io::Error::from)?;
            if dir_entry.file_type().is_dir() {
                continue;
            }
            files.push(dir_entry.into_path());
        }

        Ok(Self::new(package_file, root, files))
    }

    /// Package file this extraction came from.
    pub fn package_file(&self) -> &Path {
        &self.package_file
    }

    /// Directory the package was extracted into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracted files and symlinks, excluding directories.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Finds the extracted file for the path it would have once installed.
    ///
    /// For a package that installs `/usr/bin/foo` extracted into `/tmp/x`,
    /// `"/usr/bin/foo"` yields `/tmp/x/usr/bin/foo`. Matching is exact.
    pub fn find_by_installed_pathname(&self, pathname: &str) -> Option<&Path> {
        self.files
            .iter()
            .find(|file| self.installed_pathname(file).as_deref() == Some(pathname))
            .map(PathBuf::as_path)
    }

    /// Installed pathnames of every extracted file, in `files` order.
    pub fn installed_pathnames(&self) -> impl Iterator<Item = String> + '_ {
        self.files
            .iter()
            .filter_map(move |file| self.installed_pathname(file))
    }

    /// Checks that every extracted file still exists.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::StaleExtraction`] naming the first missing file.
    pub fn verify(&self) -> Result<()> {
        for file in &self.files {
            // symlink_metadata so that dangling links still count as present
            if fs::symlink_metadata(file).is_err() {
                return Err(InspectError::StaleExtraction {
                    root: self.root.clone(),
                    missing: file.clone(),
                });
            }
        }
        Ok(())
    }

    fn installed_pathname(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let mut pathname = String::new();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                pathname.push('/');
                pathname.push_str(part.to_str()?);
            }
        }
        Some(pathname)
    }
}
