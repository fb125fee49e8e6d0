//! Packaging files from a package's `DEBIAN/` control directory.

use crate::error::Result;
use crate::types::PermissionSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// One file from the control directory, such as `control` or `postinst`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagingFile {
    /// Full file content
    pub text: String,

    /// Permission bits the file had after extraction
    pub permissions: PermissionSet,
}

/// Packaging files keyed by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ControlFileSet {
    files: BTreeMap<String, PackagingFile>,
}

impl ControlFileSet {
    pub fn new(files: BTreeMap<String, PackagingFile>) -> Self {
        Self { files }
    }

    /// Reads every regular file at the top level of a populated control directory.
    ///
    /// Subdirectories and other non-regular entries are ignored. Any read
    /// failure, including non-UTF-8 content, fails the whole set.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut files = BTreeMap::new();

        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let path = dir_entry.path();
            let filename = dir_entry.file_name().into_string().map_err(|name| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("control filename is not UTF-8: {:?}", name),
                )
            })?;
            let text = fs::read_to_string(&path)?;
            let permissions = PermissionSet::from_mode(metadata.permissions().mode());

            files.insert(filename, PackagingFile { text, permissions });
        }

        Ok(Self { files })
    }

    /// Filenames present, in sorted order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn get(&self, filename: &str) -> Option<&PackagingFile> {
        self.files.get(filename)
    }

    /// Text of a packaging file.
    pub fn file_text(&self, filename: &str) -> Option<&str> {
        self.get(filename).map(|f| f.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
