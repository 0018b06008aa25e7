//! Sealed capability registry.
//!
//! Produced once by bootstrap and never mutated afterwards, so lookups are plain reads and
//! need no locking.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::binding::{Binding, CapabilityKey};
use crate::bootstrap::BootstrapReport;
use crate::contracts::Capability;
use crate::error::LocatorError;
use crate::foundation::{LogService, emit};
use crate::service_map::ServiceMap;

const LOG_CONTEXT: &str = "ServiceLocator";

pub struct ServiceRegistry {
    services: ServiceMap,
    declared: IndexSet<CapabilityKey>,
    report: BootstrapReport,
    log: Option<Arc<dyn LogService>>,
}

impl ServiceRegistry {
    pub(crate) fn seal(
        services: ServiceMap,
        mut declared: IndexSet<CapabilityKey>,
        report: BootstrapReport,
    ) -> Self {
        // Providers may bind capabilities no catalog entry declares.
        declared.extend(services.iter().map(|binding| *binding.capability()));
        let log = services.get::<dyn LogService>();
        Self {
            services,
            declared,
            report,
            log,
        }
    }

    /// Bound instance for capability `C`.
    ///
    /// An unbound capability is not an error: it yields `None` and a warning.
    #[must_use]
    pub fn get<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Capability,
    {
        let found = self.services.get::<C>();
        if found.is_none() {
            self.warn_miss(&CapabilityKey::capability::<C>());
        }
        found
    }

    /// Runtime-typed lookup.
    ///
    /// Behaves like [`get`](Self::get) for capability keys.
    ///
    /// # Errors
    /// `LocatorError::ContractViolation` if `key` is neither built from a capability type nor
    /// a declared capability.
    pub fn get_by_key(&self, key: &CapabilityKey) -> Result<Option<Binding>, LocatorError> {
        if !is_known_capability(&self.declared, key) {
            return Err(LocatorError::ContractViolation {
                type_name: key.name().to_owned(),
            });
        }
        let found = self.services.binding(key).cloned();
        if found.is_none() {
            self.warn_miss(key);
        }
        Ok(found)
    }

    /// Lookup by capability name: fully-qualified (`dyn app::Greeter`) or short (`Greeter`),
    /// ASCII case ignored. A fully-qualified match beats a short one; among short matches the
    /// first declared capability wins.
    ///
    /// # Errors
    /// `LocatorError::ContractViolation` if no known capability has that name.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Binding>, LocatorError> {
        let key = resolve_name(&self.declared, name).ok_or_else(|| LocatorError::ContractViolation {
            type_name: name.to_owned(),
        })?;
        self.get_by_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// `(capability, implementation)` pairs in initialization order.
    pub fn bindings(&self) -> impl Iterator<Item = (&CapabilityKey, &'static str)> + '_ {
        self.services
            .iter()
            .map(|binding| (binding.capability(), binding.implementation()))
    }

    /// Every capability the registry knows, bound or not.
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityKey> + '_ {
        self.declared.iter()
    }

    /// Failures isolated during a lenient bootstrap.
    #[must_use]
    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }

    fn warn_miss(&self, key: &CapabilityKey) {
        let message = format!("no service bound for capability `{}`", key.name());
        match &self.log {
            Some(log) => log.warn(LOG_CONTEXT, &message),
            None => emit(tracing::Level::WARN, LOG_CONTEXT, &message),
        }
    }
}

pub(crate) fn is_known_capability(declared: &IndexSet<CapabilityKey>, key: &CapabilityKey) -> bool {
    key.is_capability() || declared.contains(key)
}

pub(crate) fn resolve_name(declared: &IndexSet<CapabilityKey>, name: &str) -> Option<CapabilityKey> {
    let name = name.trim();
    declared
        .iter()
        .find(|key| {
            key.name().eq_ignore_ascii_case(name)
                || key
                    .name()
                    .strip_prefix("dyn ")
                    .is_some_and(|bare| bare.eq_ignore_ascii_case(name))
        })
        .or_else(|| declared.iter().find(|key| key.matches_name(name)))
        .copied()
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services)
            .field("declared", &self.declared.len())
            .field("failures", &self.report.failures().len())
            .finish_non_exhaustive()
    }
}
