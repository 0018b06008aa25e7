//! Bootstrap - the one-time pass that populates the registry.
//!
//! Phase order:
//! - foundation: file service, then log service (constructed, bound and initialized)
//! - discovery: one catalog snapshot
//! - overrides: config preferences, then override providers in catalog order
//! - auto-binding: first writer wins per capability, in snapshot order
//! - snapshot release
//! - initialization: every bound instance once, in binding insertion order
//!
//! Failures are collected centrally. Under lenient mode they are logged and isolated, leaving
//! the affected capability unbound; under strict mode the first one aborts the pass.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::Level;

use crate::binding::{Binding, CapabilityKey, InstanceId, ServiceInstance};
use crate::catalog::{ServiceEntry, TypeCatalog, TypeDescriptor};
use crate::config::{BootstrapMode, LocatorConfig};
use crate::context::ServiceCtx;
use crate::contracts::Capability;
use crate::diagnostics::{BindingOrigin, BootstrapObserver};
use crate::error::BootstrapFailure;
use crate::foundation::{FallbackPathFileService, FileService, LogService, TracingLog, emit};
use crate::registry::ServiceRegistry;
use crate::service_map::ServiceMap;

const LOG_CONTEXT: &str = "ServiceLocator";

/// Failures isolated during a lenient bootstrap, in the order they happened.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    failures: Vec<BootstrapFailure>,
}

impl BootstrapReport {
    #[must_use]
    pub fn failures(&self) -> &[BootstrapFailure] {
        &self.failures
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether any failure is attributed to `name` (fully-qualified or short type name).
    #[must_use]
    pub fn has_failed(&self, name: &str) -> bool {
        self.failures.iter().any(|failure| {
            let culprit = failure.culprit();
            culprit == name || crate::binding::short_name(culprit) == name
        })
    }
}

/// Outcome of one bootstrap pass.
pub(crate) struct Bootstrapped {
    /// Capabilities known when the pass ended, bound or not.
    pub(crate) declared: IndexSet<CapabilityKey>,
    pub(crate) outcome: Result<ServiceRegistry, Arc<BootstrapFailure>>,
}

/// Run a full bootstrap pass.
pub(crate) fn run(
    catalog: &dyn TypeCatalog,
    config: &LocatorConfig,
    observer: &dyn BootstrapObserver,
) -> Bootstrapped {
    let mut boot = Bootstrap::new(config, observer);
    match boot.execute(catalog) {
        Ok(()) => {
            let registry = boot.seal();
            Bootstrapped {
                declared: registry.capabilities().copied().collect(),
                outcome: Ok(registry),
            }
        }
        Err(failure) => {
            boot.log.error(&format!("service bootstrap aborted: {failure}"));
            // An abort during foundation happens before discovery; names must still resolve.
            boot.declare(&catalog.enumerate());
            Bootstrapped {
                declared: boot.declared,
                outcome: Err(Arc::new(failure)),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailurePolicy {
    Abort,
    Isolate,
}

impl From<BootstrapMode> for FailurePolicy {
    fn from(mode: BootstrapMode) -> Self {
        match mode {
            BootstrapMode::Strict => Self::Abort,
            BootstrapMode::Lenient => Self::Isolate,
        }
    }
}

/// Bootstrap log sink: the bound `LogService` once foundation is installed, plain `tracing`
/// before that or if it could not be installed.
#[derive(Default)]
struct BootLog {
    sink: Option<Arc<dyn LogService>>,
}

impl BootLog {
    fn emit(&self, level: Level, message: &str) {
        match &self.sink {
            Some(sink) => sink.log(level, LOG_CONTEXT, message),
            None => emit(level, LOG_CONTEXT, message),
        }
    }

    fn trace(&self, message: &str) {
        self.emit(Level::TRACE, message);
    }

    fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::ERROR, message);
    }
}

struct Bootstrap<'a> {
    config: &'a LocatorConfig,
    observer: &'a dyn BootstrapObserver,
    policy: FailurePolicy,
    log: BootLog,
    services: ServiceMap,
    declared: IndexSet<CapabilityKey>,
    foundation: HashSet<InstanceId>,
    // Per implementation: the constructed instance, or `None` if construction failed.
    instances: HashMap<&'static str, Option<ServiceInstance>>,
    report: BootstrapReport,
}

impl<'a> Bootstrap<'a> {
    fn new(config: &'a LocatorConfig, observer: &'a dyn BootstrapObserver) -> Self {
        Self {
            config,
            observer,
            policy: config.mode.into(),
            log: BootLog::default(),
            services: ServiceMap::new(),
            declared: IndexSet::new(),
            foundation: HashSet::new(),
            instances: HashMap::new(),
            report: BootstrapReport::default(),
        }
    }

    fn execute(&mut self, catalog: &dyn TypeCatalog) -> Result<(), BootstrapFailure> {
        self.install_foundation()?;

        self.log.debug("Phase: discovery");
        let snapshot = catalog.enumerate();
        self.declare(&snapshot);
        self.log.debug(&format!(
            "discovered {} catalog entries, {} capabilities",
            snapshot.len(),
            self.declared.len()
        ));

        self.log.debug("Phase: overrides");
        self.apply_preferences(&snapshot)?;
        self.apply_providers(&snapshot)?;

        self.log.debug("Phase: auto-binding");
        self.auto_bind(&snapshot)?;

        drop(snapshot);
        self.instances.clear();
        self.log.trace("catalog snapshot released");

        self.log.debug("Phase: initialization");
        self.initialize_all()?;

        // A provider may have replaced the foundational log service.
        self.log.sink = self.services.get::<dyn LogService>();
        Ok(())
    }

    fn seal(self) -> ServiceRegistry {
        let bound = self.services.len();
        if self.report.is_clean() {
            self.log
                .info(&format!("service bootstrap complete: {bound} capabilities bound"));
        } else {
            self.log.warn(&format!(
                "service bootstrap complete with {} isolated failure(s): {bound} capabilities bound",
                self.report.failures().len()
            ));
        }
        ServiceRegistry::seal(self.services, self.declared, self.report)
    }

    // ----- foundation ---------------------------------------------------------------------

    fn install_foundation(&mut self) -> Result<(), BootstrapFailure> {
        self.log.debug("Phase: foundation");

        let files = FallbackPathFileService::new(self.config.file_root.clone());
        self.install_one::<dyn FileService>(Arc::new(files))?;

        self.install_one::<dyn LogService>(Arc::new(TracingLog))?;
        self.log.sink = self.services.get::<dyn LogService>();
        Ok(())
    }

    fn install_one<C>(&mut self, service: Arc<C>) -> Result<(), BootstrapFailure>
    where
        C: ?Sized + Capability,
    {
        let binding = Binding::new::<C>(service);
        let key = *binding.capability();
        let implementation = binding.implementation();
        let id = binding.instance_id();

        self.declared.insert(key);
        self.observe(|observer| observer.on_constructed(implementation));
        self.services.bind(binding.clone());
        self.observe(|observer| observer.on_bound(&key, implementation, BindingOrigin::Foundation));
        self.foundation.insert(id);

        if let Err(failure) = self.initialize_binding(&binding) {
            self.services.remove_instance(id);
            self.fail(failure)?;
        }
        Ok(())
    }

    // ----- discovery ----------------------------------------------------------------------

    fn declare(&mut self, snapshot: &[TypeDescriptor]) {
        for descriptor in snapshot {
            match descriptor {
                TypeDescriptor::Capability(entry) => {
                    self.declared.insert((entry.key)());
                }
                TypeDescriptor::Service(entry) => self.declared.extend(entry.capability_keys()),
                TypeDescriptor::Provider(_) => {}
            }
        }
    }

    // ----- overrides ----------------------------------------------------------------------

    fn apply_preferences(&mut self, snapshot: &[TypeDescriptor]) -> Result<(), BootstrapFailure> {
        let config = self.config;
        for (capability, implementation) in &config.preferred {
            let unknown = |reason: &'static str| BootstrapFailure::UnknownPreference {
                capability: capability.clone(),
                implementation: implementation.clone(),
                reason,
            };

            let Some(key) = crate::registry::resolve_name(&self.declared, capability) else {
                self.fail(unknown("names an unknown capability"))?;
                continue;
            };
            let Some(entry) = snapshot
                .iter()
                .filter_map(TypeDescriptor::as_service)
                .find(|entry| entry.matches_name(implementation))
            else {
                self.fail(unknown("is not a registered implementation"))?;
                continue;
            };
            if entry.binder(&key).is_none() {
                self.fail(unknown("does not implement that capability"))?;
                continue;
            }

            if let Some(binding) = self.bind_entry(entry, key)? {
                self.log.debug(&format!(
                    "preferred `{}` for capability `{}`",
                    binding.implementation(),
                    key.name()
                ));
                self.services.bind(binding);
                self.observe(|observer| {
                    observer.on_bound(&key, entry.type_name, BindingOrigin::Preferred)
                });
            }
        }
        Ok(())
    }

    fn apply_providers(&mut self, snapshot: &[TypeDescriptor]) -> Result<(), BootstrapFailure> {
        for entry in snapshot.iter().filter_map(TypeDescriptor::as_provider) {
            self.log
                .debug(&format!("applying override provider `{}`", entry.type_name));

            // Providers write to a scratch copy; only a successful run is committed.
            let mut scratch = self.services.clone();
            let outcome = guarded(|| {
                let provider = (entry.construct)()?;
                provider.override_services(&mut scratch)
            });

            match outcome {
                Ok(()) => self.commit_overrides(entry.type_name, scratch),
                Err(source) => self.fail(BootstrapFailure::Provider {
                    provider: entry.type_name,
                    source,
                })?,
            }
        }
        Ok(())
    }

    fn commit_overrides(&mut self, provider: &'static str, scratch: ServiceMap) {
        let origin = BindingOrigin::Override { provider };
        for binding in scratch.iter() {
            let key = binding.capability();
            let changed = self
                .services
                .binding(key)
                .is_none_or(|previous| previous.instance_id() != binding.instance_id());
            if changed {
                self.declared.insert(*key);
                self.log.debug(&format!(
                    "provider `{provider}` bound `{}` to `{}`",
                    key.name(),
                    binding.implementation()
                ));
                self.observe(|observer| observer.on_bound(key, binding.implementation(), origin));
            }
        }
        self.services = scratch;
    }

    // ----- auto-binding -------------------------------------------------------------------

    fn auto_bind(&mut self, snapshot: &[TypeDescriptor]) -> Result<(), BootstrapFailure> {
        for entry in snapshot.iter().filter_map(TypeDescriptor::as_service) {
            let vacant: Vec<CapabilityKey> = entry
                .capability_keys()
                .filter(|key| !self.services.contains_key(key))
                .collect();

            for key in vacant {
                // An earlier binder of the same entry may have claimed it already.
                if self.services.contains_key(&key) {
                    continue;
                }
                let Some(binding) = self.bind_entry(entry, key)? else {
                    // Construction failed; a later implementation may still claim `key`.
                    break;
                };
                if self.services.claim(binding) {
                    self.log.trace(&format!(
                        "auto-bound `{}` to `{}`",
                        key.name(),
                        entry.type_name
                    ));
                    self.observe(|observer| {
                        observer.on_bound(&key, entry.type_name, BindingOrigin::Discovered)
                    });
                }
            }
        }
        Ok(())
    }

    /// Construct `entry` (at most once per bootstrap) and bind it under `key`.
    ///
    /// `Ok(None)` means an isolated failure.
    fn bind_entry(
        &mut self,
        entry: &'static ServiceEntry,
        key: CapabilityKey,
    ) -> Result<Option<Binding>, BootstrapFailure> {
        let Some(instance) = self.instance_of(entry, &key)? else {
            return Ok(None);
        };
        let Some(binder) = entry.binder(&key) else {
            return Ok(None);
        };
        match (binder.bind)(&instance) {
            Some(binding) => Ok(Some(binding)),
            None => {
                self.fail(BootstrapFailure::Construction {
                    implementation: entry.type_name,
                    capabilities: key.name().to_owned(),
                    source: anyhow::anyhow!(
                        "constructor produced `{}`, which cannot be bound as this capability",
                        instance.implementation()
                    ),
                })?;
                Ok(None)
            }
        }
    }

    fn instance_of(
        &mut self,
        entry: &'static ServiceEntry,
        wanted: &CapabilityKey,
    ) -> Result<Option<ServiceInstance>, BootstrapFailure> {
        if let Some(cached) = self.instances.get(entry.type_name) {
            return Ok(cached.clone());
        }

        match guarded(entry.construct) {
            Ok(instance) => {
                self.log.trace(&format!("constructed `{}`", entry.type_name));
                self.observe(|observer| observer.on_constructed(entry.type_name));
                self.instances.insert(entry.type_name, Some(instance.clone()));
                Ok(Some(instance))
            }
            Err(source) => {
                self.instances.insert(entry.type_name, None);
                self.fail(BootstrapFailure::Construction {
                    implementation: entry.type_name,
                    capabilities: wanted.name().to_owned(),
                    source,
                })?;
                Ok(None)
            }
        }
    }

    // ----- initialization -----------------------------------------------------------------

    fn initialize_all(&mut self) -> Result<(), BootstrapFailure> {
        let mut seen = self.foundation.clone();
        let pending: Vec<Binding> = self
            .services
            .iter()
            .filter(|binding| seen.insert(binding.instance_id()))
            .cloned()
            .collect();

        // Every initialize() sees the same complete map; failed instances are unbound afterwards.
        let mut failed = Vec::new();
        for binding in &pending {
            if let Err(failure) = self.initialize_binding(binding) {
                self.fail(failure)?;
                failed.push(binding.instance_id());
            }
        }

        for id in failed {
            for key in self.services.remove_instance(id) {
                self.log.warn(&format!(
                    "capability `{}` left unbound after failed initialization",
                    key.name()
                ));
            }
        }
        Ok(())
    }

    fn initialize_binding(&self, binding: &Binding) -> Result<(), BootstrapFailure> {
        let implementation = binding.implementation();
        let service = Arc::clone(binding.service());
        let ctx = ServiceCtx::new(&self.services, self.config, implementation);

        guarded(|| service.initialize(&ctx)).map_err(|source| {
            BootstrapFailure::Initialization {
                implementation,
                source,
            }
        })?;

        self.log.trace(&format!("initialized `{implementation}`"));
        self.observe(|observer| observer.on_initialized(implementation));
        Ok(())
    }

    /// Notify the observer. A panicking observer is logged and otherwise ignored.
    fn observe(&self, notify: impl FnOnce(&dyn BootstrapObserver)) {
        let observer = self.observer;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| notify(observer))) {
            self.log.warn(&format!(
                "bootstrap observer panicked: {}",
                panic_message(&*payload)
            ));
        }
    }

    // ----- failures -----------------------------------------------------------------------

    /// Central failure gate: abort under strict mode, otherwise log and record.
    fn fail(&mut self, failure: BootstrapFailure) -> Result<(), BootstrapFailure> {
        self.observe(|observer| observer.on_failure(&failure));
        match self.policy {
            FailurePolicy::Abort => Err(failure),
            FailurePolicy::Isolate => {
                self.log.warn(&format!("{failure} (isolated, bootstrap continues)"));
                self.report.failures.push(failure);
                Ok(())
            }
        }
    }
}

/// Run service or provider code, turning a panic into an error.
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
