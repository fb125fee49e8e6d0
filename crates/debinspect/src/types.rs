//! Shared type definitions: analyst configuration and POSIX permission sets.

use crate::error::{InspectError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Options controlling how an [`Analyst`](crate::Analyst) runs external tools.
#[derive(Debug, Clone)]
pub struct AnalystOptions {
    /// Program used for `--contents`, `--info` and `--control`
    pub dpkg_deb: PathBuf,

    /// Program used for `--extract`
    pub dpkg: PathBuf,

    /// Upper bound on each tool invocation (default: 30 seconds)
    pub timeout: Option<Duration>,

    /// Whether to remember results for the lifetime of the analyst
    pub memoize: bool,
}

impl Default for AnalystOptions {
    fn default() -> Self {
        Self {
            dpkg_deb: PathBuf::from("dpkg-deb"),
            dpkg: PathBuf::from("dpkg"),
            timeout: Some(Duration::from_secs(30)),
            memoize: true,
        }
    }
}

/// A single POSIX permission bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    OwnerRead,
    OwnerWrite,
    OwnerExecute,
    GroupRead,
    GroupWrite,
    GroupExecute,
    OthersRead,
    OthersWrite,
    OthersExecute,
}

impl Permission {
    /// All permissions, in symbolic notation order.
    pub const ALL: [Permission; 9] = [
        Permission::OwnerRead,
        Permission::OwnerWrite,
        Permission::OwnerExecute,
        Permission::GroupRead,
        Permission::GroupWrite,
        Permission::GroupExecute,
        Permission::OthersRead,
        Permission::OthersWrite,
        Permission::OthersExecute,
    ];

    /// Mode bit corresponding to this permission.
    pub fn mode_bit(self) -> u32 {
        match self {
            Permission::OwnerRead => 0o400,
            Permission::OwnerWrite => 0o200,
            Permission::OwnerExecute => 0o100,
            Permission::GroupRead => 0o040,
            Permission::GroupWrite => 0o020,
            Permission::GroupExecute => 0o010,
            Permission::OthersRead => 0o004,
            Permission::OthersWrite => 0o002,
            Permission::OthersExecute => 0o001,
        }
    }
}

/// Set of owner/group/other read/write/execute bits.
///
/// Special bits (setuid, setgid, sticky) are not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet {
    bits: u32,
}

impl PermissionSet {
    /// Builds a set from a file mode, ignoring everything above `0o777`.
    pub fn from_mode(mode: u32) -> Self {
        Self { bits: mode & 0o777 }
    }

    /// Set with every permission present.
    pub fn all() -> Self {
        Self::from_mode(0o777)
    }

    /// Parses nine characters of symbolic notation such as `rwxr-xr-x`.
    ///
    /// In execute positions `s` and `t` count as executable while `S` and `T`
    /// do not, matching `ls -l` output for setuid/setgid/sticky files.
    pub fn from_symbolic(symbolic: &str) -> Result<Self> {
        let chars: Vec<char> = symbolic.chars().collect();
        if chars.len() != 9 {
            return Err(InspectError::InvalidPermissions(symbolic.to_string()));
        }

        let mut bits = 0;
        for (ch, permission) in chars.iter().zip(Permission::ALL) {
            let expected = match permission {
                Permission::OwnerRead | Permission::GroupRead | Permission::OthersRead => "r",
                Permission::OwnerWrite | Permission::GroupWrite | Permission::OthersWrite => "w",
                _ => "xst",
            };
            if expected.contains(*ch) {
                bits |= permission.mode_bit();
            } else if *ch != '-' && !(expected == "xst" && "ST".contains(*ch)) {
                return Err(InspectError::InvalidPermissions(symbolic.to_string()));
            }
        }

        Ok(Self { bits })
    }

    /// Mode bits of this set.
    pub fn mode(&self) -> u32 {
        self.bits
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.bits & permission.mode_bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates over the permissions present, in symbolic notation order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let bits = iter.into_iter().fold(0, |bits, p| bits | p.mode_bit());
        Self { bits }
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (permission, symbol) in Permission::ALL.iter().zip("rwxrwxrwx".chars()) {
            let ch = if self.contains(*permission) { symbol } else { '-' };
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

// Serialized in symbolic notation so JSON output reads like `ls -l`
impl Serialize for PermissionSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
