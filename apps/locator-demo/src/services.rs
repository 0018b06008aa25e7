//! Capabilities and implementations wired up by the locator.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use parking_lot::Mutex;
use serde::Deserialize;
use service_locator::{FileService, LogService, Service, ServiceCtx, capability, service};

#[capability]
pub trait Greeter: Service {
    fn greet(&self, name: &str) -> String;
}

/// Append-only record of what the demo did.
#[capability]
pub trait Journal: Service {
    /// # Errors
    /// Storage failures of the backing journal.
    fn append(&self, line: &str) -> anyhow::Result<()>;

    /// # Errors
    /// Storage failures of the backing journal.
    fn entries(&self) -> anyhow::Result<Vec<String>>;
}

// ----- greeters -------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GreeterConfig {
    salutation: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            salutation: "Hello".to_owned(),
        }
    }
}

#[service(capabilities = [dyn Greeter], priority = 10)]
#[derive(Default)]
pub struct PlainGreeter {
    salutation: OnceLock<String>,
}

impl Service for PlainGreeter {
    fn initialize(&self, ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        let config: GreeterConfig = ctx.config_or_default()?;
        if let Some(log) = ctx.get::<dyn LogService>() {
            log.debug("PlainGreeter", &format!("salutation set to {:?}", config.salutation));
        }
        // A second initialize would be a locator bug; keep the first value.
        let _ = self.salutation.set(config.salutation);
        Ok(())
    }
}

impl Greeter for PlainGreeter {
    fn greet(&self, name: &str) -> String {
        let salutation = self.salutation.get().map_or("Hello", String::as_str);
        format!("{salutation}, {name}!")
    }
}

#[service(capabilities = [dyn Greeter])]
#[derive(Default)]
pub struct ShoutingGreeter;

impl Service for ShoutingGreeter {}

impl Greeter for ShoutingGreeter {
    fn greet(&self, name: &str) -> String {
        format!("HELLO, {}!", name.to_uppercase())
    }
}

// ----- journals -------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileJournalConfig {
    path: PathBuf,
}

impl Default for FileJournalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("journal.log"),
        }
    }
}

struct JournalFile {
    files: Arc<dyn FileService>,
    path: PathBuf,
}

/// Journal stored through the foundational file service.
#[service(capabilities = [dyn Journal], priority = 10)]
#[derive(Default)]
pub struct FileJournal {
    file: OnceLock<JournalFile>,
    lock: Mutex<()>,
}

impl FileJournal {
    fn file(&self) -> anyhow::Result<&JournalFile> {
        self.file.get().context("file journal used before initialization")
    }
}

impl Service for FileJournal {
    fn initialize(&self, ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        let config: FileJournalConfig = ctx.config_or_default()?;
        let files = ctx
            .get::<dyn FileService>()
            .context("file journal requires a bound FileService")?;
        if !files.exists(&config.path) {
            files
                .write(&config.path, b"")
                .with_context(|| format!("failed to create {}", files.resolve(&config.path).display()))?;
        }
        let _ = self.file.set(JournalFile {
            files,
            path: config.path,
        });
        Ok(())
    }
}

impl Journal for FileJournal {
    fn append(&self, line: &str) -> anyhow::Result<()> {
        let file = self.file()?;
        let _guard = self.lock.lock();
        let mut contents = file.files.read_to_string(&file.path)?;
        contents.push_str(line);
        contents.push('\n');
        file.files.write(&file.path, contents.as_bytes())?;
        Ok(())
    }

    fn entries(&self) -> anyhow::Result<Vec<String>> {
        let file = self.file()?;
        let contents = file.files.read_to_string(&file.path)?;
        Ok(contents.lines().map(str::to_owned).collect())
    }
}

/// Process-local journal; nothing survives the process.
#[service(capabilities = [dyn Journal])]
#[derive(Debug, Default)]
pub struct MemoryJournal {
    lines: Mutex<Vec<String>>,
}

impl Service for MemoryJournal {}

impl Journal for MemoryJournal {
    fn append(&self, line: &str) -> anyhow::Result<()> {
        self.lines.lock().push(line.to_owned());
        Ok(())
    }

    fn entries(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.lines.lock().clone())
    }
}
