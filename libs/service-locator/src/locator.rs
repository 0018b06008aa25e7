//! Lookup façade.
//!
//! [`ServiceLocator`] owns a catalog, a config and a one-time bootstrap guard. The first lookup
//! (or an explicit [`ServiceLocator::bootstrap`]) runs the pass; concurrent first callers block
//! until it finishes, and every later call reads the sealed registry.
//!
//! One locator can be made process-wide with [`install`]; [`global`] falls back to an
//! inventory-backed locator configured from the environment.

use std::sync::{Arc, OnceLock};

use crate::binding::{Binding, CapabilityKey};
use crate::bootstrap::{self, Bootstrapped};
use crate::catalog::{InventoryCatalog, TypeCatalog};
use crate::config::LocatorConfig;
use crate::contracts::Capability;
use crate::diagnostics::{BootstrapObserver, NoopObserver};
use crate::error::LocatorError;
use crate::registry::{ServiceRegistry, is_known_capability, resolve_name};

pub struct ServiceLocator {
    catalog: Box<dyn TypeCatalog>,
    config: LocatorConfig,
    observer: Option<Arc<dyn BootstrapObserver>>,
    state: OnceLock<Bootstrapped>,
}

impl ServiceLocator {
    /// Create a locator; nothing runs until the first lookup or [`bootstrap`](Self::bootstrap).
    pub fn new(catalog: impl TypeCatalog + 'static, config: LocatorConfig) -> Self {
        Self {
            catalog: Box::new(catalog),
            config,
            observer: None,
            state: OnceLock::new(),
        }
    }

    /// Locator over every `#[capability]`, `#[service]` and `#[override_provider]` in the binary.
    #[must_use]
    pub fn from_inventory(config: LocatorConfig) -> Self {
        Self::new(InventoryCatalog, config)
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn BootstrapObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run bootstrap if it has not run yet and return the sealed registry.
    ///
    /// Safe to call from many threads; exactly one pass ever runs.
    /// Must not be called from inside `Service::initialize`: use the `ServiceCtx` instead.
    ///
    /// # Errors
    /// `LocatorError::Bootstrap` if a strict-mode bootstrap aborted. Every call reports the
    /// same cause.
    pub fn bootstrap(&self) -> Result<&ServiceRegistry, LocatorError> {
        match &self.state().outcome {
            Ok(registry) => Ok(registry),
            Err(failure) => Err(LocatorError::Bootstrap(Arc::clone(failure))),
        }
    }

    #[must_use]
    pub fn is_bootstrapped(&self) -> bool {
        self.state.get().is_some()
    }

    /// Bound instance for capability `C`, or `None` (with a warning) if it is unbound.
    ///
    /// # Errors
    /// `LocatorError::Bootstrap` if a strict-mode bootstrap aborted.
    pub fn get<C>(&self) -> Result<Option<Arc<C>>, LocatorError>
    where
        C: ?Sized + Capability,
    {
        Ok(self.bootstrap()?.get::<C>())
    }

    /// Runtime-typed lookup.
    ///
    /// # Errors
    /// `LocatorError::ContractViolation` if `key` is neither built from a capability type nor
    /// a declared capability (checked first, whatever the bootstrap outcome), otherwise
    /// `LocatorError::Bootstrap` after a strict-mode abort.
    pub fn get_by_key(&self, key: &CapabilityKey) -> Result<Option<Binding>, LocatorError> {
        let state = self.state();
        if !is_known_capability(&state.declared, key) {
            return Err(LocatorError::ContractViolation {
                type_name: key.name().to_owned(),
            });
        }
        self.bootstrap()?.get_by_key(key)
    }

    /// Lookup by capability name (`Greeter` or `dyn my_app::Greeter`, ASCII case ignored).
    ///
    /// # Errors
    /// Same as [`get_by_key`](Self::get_by_key).
    pub fn get_by_name(&self, name: &str) -> Result<Option<Binding>, LocatorError> {
        let key = resolve_name(&self.state().declared, name).ok_or_else(|| {
            LocatorError::ContractViolation {
                type_name: name.to_owned(),
            }
        })?;
        self.get_by_key(&key)
    }

    #[must_use]
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    fn state(&self) -> &Bootstrapped {
        self.state.get_or_init(|| {
            let observer: &dyn BootstrapObserver = match &self.observer {
                Some(observer) => observer.as_ref(),
                None => &NoopObserver,
            };
            bootstrap::run(self.catalog.as_ref(), &self.config, observer)
        })
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("mode", &self.config.mode)
            .field("bootstrapped", &self.is_bootstrapped())
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

// ----- process-wide locator ------------------------------------------------------------------

static GLOBAL: OnceLock<ServiceLocator> = OnceLock::new();

/// Make `locator` the process-wide locator.
///
/// # Errors
/// Returns the rejected locator if one is already installed (explicitly or by [`global`]).
pub fn install(locator: ServiceLocator) -> Result<&'static ServiceLocator, ServiceLocator> {
    GLOBAL.set(locator)?;
    Ok(global())
}

/// The process-wide locator. Installs an inventory-backed one configured from `LOCATOR__*`
/// environment variables if none was installed.
pub fn global() -> &'static ServiceLocator {
    GLOBAL.get_or_init(|| {
        let config = LocatorConfig::from_env().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "invalid locator configuration in environment, using defaults");
            LocatorConfig::default()
        });
        ServiceLocator::from_inventory(config)
    })
}

/// [`ServiceLocator::get`] on the process-wide locator.
///
/// # Errors
/// `LocatorError::Bootstrap` if a strict-mode bootstrap aborted.
pub fn get<C>() -> Result<Option<Arc<C>>, LocatorError>
where
    C: ?Sized + Capability,
{
    global().get::<C>()
}

/// [`ServiceLocator::get_by_key`] on the process-wide locator.
///
/// # Errors
/// `LocatorError::ContractViolation` or `LocatorError::Bootstrap`.
pub fn get_by_key(key: &CapabilityKey) -> Result<Option<Binding>, LocatorError> {
    global().get_by_key(key)
}

/// [`ServiceLocator::get_by_name`] on the process-wide locator.
///
/// # Errors
/// `LocatorError::ContractViolation` or `LocatorError::Bootstrap`.
pub fn get_by_name(name: &str) -> Result<Option<Binding>, LocatorError> {
    global().get_by_name(name)
}

/// Bootstrap the process-wide locator now instead of on first lookup.
///
/// # Errors
/// `LocatorError::Bootstrap` if a strict-mode bootstrap aborted.
pub fn warm_up() -> Result<&'static ServiceRegistry, LocatorError> {
    global().bootstrap()
}
