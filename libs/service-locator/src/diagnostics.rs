//! Bootstrap observation hooks.
//!
//! An observer sees every construction, binding, initialization and isolated failure as it
//! happens. Intended for diagnostics and tests; the locator behaves the same with or without one.

use crate::binding::CapabilityKey;
use crate::error::BootstrapFailure;

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOrigin {
    /// Installed by the locator before discovery.
    Foundation,
    /// `preferred` entry of the locator config.
    Preferred,
    /// Written by an override provider.
    Override { provider: &'static str },
    /// First-writer-wins auto-binding from the catalog.
    Discovered,
}

/// Receives bootstrap events synchronously, on the thread running the pass.
///
/// A panic inside a hook is caught and logged; the pass carries on as if the hook had returned.
#[allow(unused_variables)]
pub trait BootstrapObserver: Send + Sync {
    /// An implementation was constructed by the locator.
    fn on_constructed(&self, implementation: &'static str) {}

    fn on_bound(&self, capability: &CapabilityKey, implementation: &'static str, origin: BindingOrigin) {}

    /// `initialize` returned `Ok` for this implementation.
    fn on_initialized(&self, implementation: &'static str) {}

    /// A failure was isolated (lenient) or is about to abort bootstrap (strict).
    fn on_failure(&self, failure: &BootstrapFailure) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NoopObserver;

impl BootstrapObserver for NoopObserver {}
