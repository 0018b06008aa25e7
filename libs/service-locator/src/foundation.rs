//! Foundational services.
//!
//! Installed and initialized by the locator before the type catalog is enumerated, so every
//! later bootstrap step can log and touch files. The generic initialization pass skips these
//! exact instances; an override that replaces one of them is initialized like any other service.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing::Level;

use crate::context::ServiceCtx;
use crate::contracts::{Capability, Service};

/// Leveled log sink. Every message carries the label of the component that emitted it.
pub trait LogService: Service {
    fn log(&self, level: Level, context: &str, message: &str);

    fn trace(&self, context: &str, message: &str) {
        self.log(Level::TRACE, context, message);
    }

    fn debug(&self, context: &str, message: &str) {
        self.log(Level::DEBUG, context, message);
    }

    fn info(&self, context: &str, message: &str) {
        self.log(Level::INFO, context, message);
    }

    fn warn(&self, context: &str, message: &str) {
        self.log(Level::WARN, context, message);
    }

    fn error(&self, context: &str, message: &str) {
        self.log(Level::ERROR, context, message);
    }
}

impl Capability for dyn LogService {
    fn into_service(this: Arc<Self>) -> Arc<dyn Service> {
        this
    }
}

/// Default [`LogService`]: forwards to `tracing` with a `context` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl Service for TracingLog {}

impl LogService for TracingLog {
    fn log(&self, level: Level, context: &str, message: &str) {
        emit(level, context, message);
    }
}

pub(crate) fn emit(level: Level, context: &str, message: &str) {
    match level {
        Level::ERROR => tracing::error!(context = context, "{message}"),
        Level::WARN => tracing::warn!(context = context, "{message}"),
        Level::INFO => tracing::info!(context = context, "{message}"),
        Level::DEBUG => tracing::debug!(context = context, "{message}"),
        _ => tracing::trace!(context = context, "{message}"),
    }
}

/// Minimal file access rooted at one directory.
pub trait FileService: Service {
    fn root(&self) -> &Path;

    /// Relative paths resolve against [`root`](Self::root); absolute paths are kept.
    fn resolve(&self, path: &Path) -> PathBuf;

    /// # Errors
    /// Any I/O error reading the resolved path.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write `contents`, creating missing parent directories.
    ///
    /// # Errors
    /// Any I/O error creating directories or writing the resolved path.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

impl Capability for dyn FileService {
    fn into_service(this: Arc<Self>) -> Arc<dyn Service> {
        this
    }
}

/// Default [`FileService`]: resolves relative paths against a configured root, falling back
/// to the process working directory when none is configured.
#[derive(Debug, Clone)]
pub struct FallbackPathFileService {
    root: PathBuf,
}

impl FallbackPathFileService {
    #[must_use]
    pub fn new(root: Option<PathBuf>) -> Self {
        let root = root.unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        });
        Self { root }
    }
}

impl Default for FallbackPathFileService {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Service for FallbackPathFileService {
    fn initialize(&self, _ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create file root {}", self.root.display()))
    }
}

impl FileService for FallbackPathFileService {
    fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::LocatorConfig;
    use crate::service_map::ServiceMap;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn tracing_log_forwards_level_context_and_message() {
        let log: Arc<dyn LogService> = Arc::new(TracingLog);
        log.warn("Billing", "invoice queue is full");
        log.debug("Billing", "retrying");

        assert!(logs_contain("invoice queue is full"));
        assert!(logs_contain("context=\"Billing\""));
        assert!(logs_contain("WARN"));
        assert!(logs_contain("retrying"));
    }

    #[test]
    fn file_service_resolves_relative_paths_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let files = FallbackPathFileService::new(Some(dir.path().to_path_buf()));

        assert_eq!(files.resolve(Path::new("a/b.txt")), dir.path().join("a/b.txt"));
        let absolute = dir.path().join("abs.txt");
        assert_eq!(files.resolve(&absolute), absolute);
    }

    #[test]
    fn file_service_writes_reads_and_checks_existence() {
        let dir = tempfile::tempdir().unwrap();
        let files = FallbackPathFileService::new(Some(dir.path().to_path_buf()));
        let path = Path::new("nested/journal.log");

        assert!(!files.exists(path));
        files.write(path, b"first entry").unwrap();
        assert!(files.exists(path));
        assert_eq!(files.read_to_string(path).unwrap(), "first entry");
    }

    #[test]
    fn initialize_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("state").join("files");
        let files = FallbackPathFileService::new(Some(root.clone()));

        let map = ServiceMap::new();
        let config = LocatorConfig::default();
        let ctx = ServiceCtx::new(&map, &config, "FallbackPathFileService");
        files.initialize(&ctx).unwrap();

        assert!(root.is_dir());
    }

    #[test]
    fn missing_root_falls_back_to_working_directory() {
        let files = FallbackPathFileService::default();
        assert_eq!(files.root(), std::env::current_dir().unwrap());
    }
}
