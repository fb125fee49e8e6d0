//! Error types for package inspection operations.

use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, InspectError>;

/// Main error type for inspection operations.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Package file not found at the specified path.
    #[error("Package not found: {0}")]
    PackageNotFound(PathBuf),

    /// An external tool ran but did not exit successfully.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    #[error("{tool} failed (exit code {}): {stderr}", display_exit_code(.exit_code))]
    ToolFailed {
        /// Program that was invoked
        tool: String,
        /// Exit code reported by the process
        exit_code: Option<i32>,
        /// Standard error of the process, verbatim
        stderr: String,
    },

    /// An external tool did not finish within its time bound.
    #[error("{tool} timed out after {timeout:?}")]
    ToolTimeout {
        /// Program that was invoked
        tool: String,
        /// Configured bound
        timeout: Duration,
    },

    /// An external tool could not be started.
    #[error("Failed to start {tool}: {source}")]
    ToolSpawn {
        /// Program that was invoked
        tool: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// A line of `dpkg-deb --contents` output could not be parsed.
    #[error("Unparseable contents line: {0}")]
    LineParse(#[from] LineParseError),

    /// A previously returned extraction refers to files that no longer exist.
    #[error("Extraction in {} is stale: {} no longer exists", .root.display(), .missing.display())]
    StaleExtraction {
        /// Extraction directory
        root: PathBuf,
        /// First file found missing
        missing: PathBuf,
    },

    /// The first character of a permission string is not `-`, `d` or `l`.
    #[error("Unrecognized entry kind: {0:?} (expected one of '-', 'd', 'l')")]
    UnrecognizedEntryKind(char),

    /// A permission string is not of the form `?rwxrwxrwx`.
    #[error("Invalid permission string: {0}")]
    InvalidPermissions(String),

    /// An I/O error occurred while reading a scratch or extraction directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a single contents line fails to parse.
#[derive(Debug, Error)]
pub enum LineParseError {
    /// The line has fewer than six whitespace-separated fields.
    #[error("missing field {index} in {line:?}")]
    MissingToken {
        /// Zero-based index of the first missing field
        index: usize,
        /// The offending line
        line: String,
    },

    /// The size field is not a non-negative integer.
    #[error("invalid size {token:?}: {source}")]
    InvalidSize {
        /// The size field as it appeared
        token: String,
        /// Integer parse failure
        #[source]
        source: ParseIntError,
    },
}

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none, killed by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_keeps_stderr_verbatim() {
        let err = InspectError::ToolFailed {
            tool: "dpkg-deb".to_string(),
            exit_code: Some(2),
            stderr: "dpkg-deb: error: 'x.deb' is not a Debian format archive\n".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code 2"));
        assert!(message.contains("dpkg-deb: error: 'x.deb' is not a Debian format archive\n"));
    }

    #[test]
    fn signal_exit_is_described() {
        let err = InspectError::ToolFailed {
            tool: "dpkg".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("killed by signal"));
    }
}
