//! Entries of a package's content listing and the `dpkg-deb --contents` line parser.

use crate::error::{InspectError, LineParseError, Result};
use crate::types::PermissionSet;
use serde::Serialize;
use std::fmt;

/// Separator `dpkg-deb` places between a symlink's path and its target.
const LINK_SEPARATOR: &str = " -> ";

/// Number of whitespace-separated fields in a contents line.
const FIELD_COUNT: usize = 6;

/// Kind of filesystem item, derived from the first permission character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file (`-`)
    File,
    /// Directory (`d`)
    Directory,
    /// Symbolic link (`l`)
    Link,
}

impl EntryKind {
    /// Maps a type character from a permission string to a kind.
    pub fn from_char(ch: char) -> Result<Self> {
        match ch {
            '-' => Ok(EntryKind::File),
            'd' => Ok(EntryKind::Directory),
            'l' => Ok(EntryKind::Link),
            other => Err(InspectError::UnrecognizedEntryKind(other)),
        }
    }
}

/// One item of a package's content listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Absolute path the item would have once installed; directories end with `/`
    pub path: String,

    /// Symbolic permissions with leading type character, e.g. `-rwxr-xr-x`
    pub permission_string: String,

    /// Ownership as `owner:group`, e.g. `root:root` or `root:1056`
    pub ownership: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Modification time formatted as `yyyy-MM-dd HH:mm`
    pub modified_at: String,

    /// Target of a symbolic link, when one could be found on the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,

    #[serde(skip)]
    line: String,
}

impl Entry {
    /// Parses one line of `dpkg-deb --contents` output.
    ///
    /// The expected shape is
    /// `<perms> <owner>/<group> <size> <date> <time> ./<path>[ -> <target>]`.
    /// The path field keeps any internal whitespace. A symlink line without
    /// ` -> ` still parses, with `link_target` left empty.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::LineParse`] when a field is missing or the size is
    /// not a non-negative integer.
    pub fn parse(line: &str) -> Result<Self> {
        let fields = split_fields(line);
        if fields.len() < FIELD_COUNT {
            return Err(LineParseError::MissingToken {
                index: fields.len(),
                line: line.to_string(),
            }
            .into());
        }

        let permission_string = fields[0].to_string();
        let ownership = fields[1].replace('/', ":");
        let size_bytes = fields[2]
            .parse::<u64>()
            .map_err(|source| LineParseError::InvalidSize {
                token: fields[2].to_string(),
                source,
            })?;
        let modified_at = format!("{} {}", fields[3], fields[4]);

        let raw_path = fields[5];
        let mut path = raw_path.strip_prefix('.').unwrap_or(raw_path).to_string();
        let mut link_target = None;

        if permission_string.starts_with('l') {
            // A filename that itself contains " -> " is split at the first occurrence
            match path.find(LINK_SEPARATOR) {
                Some(pos) => {
                    link_target = Some(path[pos + LINK_SEPARATOR.len()..].to_string());
                    path.truncate(pos);
                }
                None => {
                    tracing::debug!("no link target found in contents line: {}", line);
                }
            }
        }

        Ok(Entry {
            path,
            permission_string,
            ownership,
            size_bytes,
            modified_at,
            link_target,
            line: line.to_string(),
        })
    }

    /// Type character of the permission string, typically `-`, `d` or `l`.
    pub fn raw_kind(&self) -> Option<char> {
        self.permission_string.chars().next()
    }

    /// Kind of this entry.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::UnrecognizedEntryKind`] if the type character is
    /// anything other than `-`, `d` or `l`.
    pub fn kind(&self) -> Result<EntryKind> {
        match self.raw_kind() {
            Some(ch) => EntryKind::from_char(ch),
            None => Err(InspectError::InvalidPermissions(String::new())),
        }
    }

    /// Permission bits encoded in the last nine characters of the permission string.
    pub fn permissions(&self) -> Result<PermissionSet> {
        let mut chars = self.permission_string.chars();
        chars.next();
        PermissionSet::from_symbolic(chars.as_str())
            .map_err(|_| InspectError::InvalidPermissions(self.permission_string.clone()))
    }

    /// The line this entry was parsed from.
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Splits a line on runs of whitespace into at most six fields; the last
/// field is the untouched remainder of the line.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        if fields.len() == FIELD_COUNT - 1 {
            fields.push(rest);
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    fields
}
