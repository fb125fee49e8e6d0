//! # debinspect
//!
//! Inspection of Debian (`.deb`) packages through the system's dpkg tools.
//!
//! The library runs `dpkg-deb` and `dpkg` as subprocesses and turns their text
//! output into structured values:
//!
//! - `dpkg-deb --contents` becomes a [`ContentsIndex`] of [`Entry`] records
//! - `dpkg-deb --info` becomes an [`InfoRecord`] with control field lookup
//! - `dpkg-deb --control` becomes a [`ControlFileSet`] of packaging files
//! - `dpkg --extract` becomes an [`ExtractionResult`] that maps installed
//!   pathnames back to extracted files
//!
//! ## Example
//!
//! ```rust,no_run
//! use debinspect::{Analyst, EntryKind};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let analyst = Analyst::new("hello_2.10-1build1_amd64.deb");
//!
//! let contents = analyst.contents().await?;
//! if let Some(entry) = contents.find_by_path("/usr/bin/hello") {
//!     assert_eq!(entry.kind()?, EntryKind::File);
//! }
//!
//! let info = analyst.info().await?;
//! println!("Version: {:?}", info.value("Version"));
//!
//! let extraction = analyst.extract(Path::new("/tmp/hello-extracted")).await?;
//! if let Some(copyright) = extraction.find_by_installed_pathname("/usr/share/doc/hello/copyright") {
//!     println!("{}", std::fs::read_to_string(copyright)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyst;
pub mod contents;
pub mod control;
pub mod entry;
pub mod error;
pub mod extraction;
pub mod info;
pub mod process;
pub mod types;

// Re-export main types
pub use analyst::Analyst;
pub use contents::ContentsIndex;
pub use control::{ControlFileSet, PackagingFile};
pub use entry::{Entry, EntryKind};
pub use error::{InspectError, LineParseError, Result};
pub use extraction::ExtractionResult;
pub use info::InfoRecord;
pub use process::{CommandRunner, Invocation, ProcessOutput, TokioRunner};
pub use types::{AnalystOptions, Permission, PermissionSet};

/// Parses a single line of `dpkg-deb --contents` output.
///
/// Unlike [`ContentsIndex::from_listing`], which skips bad lines, this reports
/// the failure.
///
/// # Errors
///
/// Returns [`InspectError::LineParse`] if a field is missing or the size is not
/// numeric.
pub fn parse_contents_line(line: &str) -> Result<Entry> {
    Entry::parse(line)
}
