//! Façade that runs `dpkg-deb` and `dpkg` against one package file.

use crate::contents::ContentsIndex;
use crate::control::ControlFileSet;
use crate::error::{InspectError, Result};
use crate::extraction::ExtractionResult;
use crate::info::InfoRecord;
use crate::process::{CommandRunner, Invocation, ProcessOutput, TokioRunner};
use crate::types::AnalystOptions;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Analyzes a package file by invoking the dpkg tools.
///
/// With [`AnalystOptions::memoize`] set, contents and info are computed at
/// most once per analyst, and extractions are remembered per destination
/// directory. A remembered extraction is checked against the filesystem each
/// time it is returned, so a deleted extraction directory is reported as
/// [`InspectError::StaleExtraction`] rather than silently re-extracted.
///
/// A package file that changes on disk is not noticed by the memoized values;
/// create a new analyst in that case.
pub struct Analyst<R = TokioRunner> {
    package_file: PathBuf,
    options: AnalystOptions,
    runner: R,
    contents: OnceCell<Arc<ContentsIndex>>,
    info: OnceCell<Arc<InfoRecord>>,
    extractions: Mutex<HashMap<PathBuf, ExtractionResult>>,
}

impl Analyst<TokioRunner> {
    /// Creates an analyst with default options.
    pub fn new(package_file: impl Into<PathBuf>) -> Self {
        Self::with_options(package_file, AnalystOptions::default())
    }

    pub fn with_options(package_file: impl Into<PathBuf>, options: AnalystOptions) -> Self {
        Self::with_runner(package_file, options, TokioRunner)
    }
}

impl<R: CommandRunner> Analyst<R> {
    /// Creates an analyst that runs tools through `runner`.
    pub fn with_runner(package_file: impl Into<PathBuf>, options: AnalystOptions, runner: R) -> Self {
        Self {
            package_file: package_file.into(),
            options,
            runner,
            contents: OnceCell::new(),
            info: OnceCell::new(),
            extractions: Mutex::new(HashMap::new()),
        }
    }

    /// Package file this analyst inspects.
    pub fn package_file(&self) -> &Path {
        &self.package_file
    }

    pub fn options(&self) -> &AnalystOptions {
        &self.options
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Lists the package's contents; the equivalent of `dpkg-deb --contents`.
    ///
    /// Lines of output that cannot be parsed are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the package does not exist or `dpkg-deb` fails.
    pub async fn contents(&self) -> Result<Arc<ContentsIndex>> {
        if !self.options.memoize {
            return self.load_contents().await;
        }
        self.contents
            .get_or_try_init(|| self.load_contents())
            .await
            .map(Arc::clone)
    }

    /// Reads the package's info; the equivalent of `dpkg-deb --info`.
    pub async fn info(&self) -> Result<Arc<InfoRecord>> {
        if !self.options.memoize {
            return self.load_info().await;
        }
        self.info
            .get_or_try_init(|| self.load_info())
            .await
            .map(Arc::clone)
    }

    /// Extracts the control directory into `scratch_dir` and reads its files.
    ///
    /// The scratch directory is left in place; its lifecycle belongs to the
    /// caller. Control sets are never memoized.
    ///
    /// # Errors
    ///
    /// Returns an error if `dpkg-deb --control` fails or the scratch directory
    /// cannot be read. No partial set is returned.
    pub async fn control(&self, scratch_dir: &Path) -> Result<ControlFileSet> {
        let package = self.resolve_package().await?;
        let invocation = self
            .dpkg_deb("--control", &package)
            .arg(scratch_dir);
        self.run_tool(invocation).await?;

        let dir = scratch_dir.to_path_buf();
        let control = blocking(move || ControlFileSet::from_directory(&dir)).await?;
        tracing::debug!(
            "read {} control files from {}",
            control.len(),
            scratch_dir.display()
        );
        Ok(control)
    }

    /// Like [`control`](Self::control), using a temporary scratch directory that
    /// is removed afterwards.
    pub async fn control_in_temp_dir(&self) -> Result<ControlFileSet> {
        let scratch = tempfile::Builder::new()
            .prefix("deb-control-output")
            .tempdir()?;
        let result = self.control(scratch.path()).await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::warn!(
                "failed to delete temporary directory at {}: {}",
                scratch_path.display(),
                e
            );
        }
        result
    }

    /// Extracts the package's filesystem tree into `destination`; the
    /// equivalent of `dpkg --extract`.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::ToolFailed`] carrying the tool's standard error on
    /// failure, and [`InspectError::StaleExtraction`] if a remembered extraction
    /// into the same directory has lost files since. A stale extraction
    /// directory is left as found.
    pub async fn extract(&self, destination: &Path) -> Result<ExtractionResult> {
        let package = self.resolve_package().await?;

        if self.options.memoize {
            if let Some(cached) = self.cached_extraction(destination).await? {
                cached.verify()?;
                tracing::debug!("reusing extraction in {}", cached.root().display());
                return Ok(cached);
            }
        }

        tokio::fs::create_dir_all(destination).await?;
        let root = tokio::fs::canonicalize(destination).await?;

        let invocation = Invocation::new(&self.options.dpkg)
            .arg("--extract")
            .arg(&package)
            .arg(&root)
            .timeout(self.options.timeout);
        self.run_tool(invocation).await?;

        let scan_root = root.clone();
        let extraction = blocking(move || ExtractionResult::scan(package, scan_root)).await?;
        tracing::info!(
            "extracted {} files from {} into {}",
            extraction.files().len(),
            self.package_file.display(),
            root.display()
        );

        if self.options.memoize {
            let mut extractions = self.extractions.lock();
            extractions.insert(destination.to_path_buf(), extraction.clone());
            extractions.insert(root, extraction.clone());
        }
        Ok(extraction)
    }

    /// Looks up a remembered extraction by the caller's path, then by the
    /// canonical path when the directory still exists.
    async fn cached_extraction(&self, destination: &Path) -> Result<Option<ExtractionResult>> {
        let cached = self.extractions.lock().get(destination).cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        match tokio::fs::canonicalize(destination).await {
            Ok(root) => Ok(self.extractions.lock().get(&root).cloned()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_contents(&self) -> Result<Arc<ContentsIndex>> {
        let package = self.resolve_package().await?;
        let output = self.run_tool(self.dpkg_deb("--contents", &package)).await?;
        let index = ContentsIndex::from_listing(&output.stdout_text());
        tracing::debug!("indexed {} entries of {}", index.len(), package.display());
        Ok(Arc::new(index))
    }

    async fn load_info(&self) -> Result<Arc<InfoRecord>> {
        let package = self.resolve_package().await?;
        let output = self.run_tool(self.dpkg_deb("--info", &package)).await?;
        Ok(Arc::new(InfoRecord::new(output.stdout_text())))
    }

    fn dpkg_deb(&self, operation: &str, package: &Path) -> Invocation {
        Invocation::new(&self.options.dpkg_deb)
            .arg(operation)
            .arg(package)
            .timeout(self.options.timeout)
    }

    async fn run_tool(&self, invocation: Invocation) -> Result<ProcessOutput> {
        let tool = invocation.tool_name();
        self.runner.run(&invocation).await?.check(&tool)
    }

    /// Absolute path of the package file, which must exist.
    async fn resolve_package(&self) -> Result<PathBuf> {
        match tokio::fs::canonicalize(&self.package_file).await {
            Ok(path) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(InspectError::PackageNotFound(self.package_file.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Runs filesystem work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}
