use std::sync::Arc;

use crate::context::ServiceCtx;
use crate::service_map::ServiceMap;

/// Lifecycle contract every registrable implementation satisfies.
///
/// Implementations are default-constructed by the locator (no constructor arguments) and then
/// initialized exactly once, after every binding has been settled.
pub trait Service: Send + Sync + 'static {
    /// Runs once per instance after all overrides and auto-bindings are in place.
    ///
    /// `ctx` exposes the complete binding map, so lookups made here never observe a
    /// partially-built registry.
    ///
    /// # Errors
    /// Returning an error marks the instance as failed; under lenient mode its bindings are
    /// dropped, under strict mode bootstrap aborts.
    fn initialize(&self, ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Concrete type name, used in logs and diagnostics.
    fn service_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Marker for capability contracts, implemented for `dyn Trait` where `Trait: Service`.
///
/// Use `#[capability]` on the trait declaration instead of implementing this by hand.
/// Only `dyn Trait` types implementing `Capability` can be looked up, which turns the
/// "lookup key must be an interface" rule into a compile-time bound.
pub trait Capability: Send + Sync + 'static {
    /// Upcast a capability handle to the lifecycle contract.
    fn into_service(this: Arc<Self>) -> Arc<dyn Service>;
}

/// Bootstrap-time contributor that may pre-seed or force bindings before auto-discovery.
///
/// Providers are default-constructed and invoked once, in catalog order. Bindings inserted
/// here always win over auto-discovered implementations of the same capability and are
/// initialized in the order they were inserted.
pub trait OverrideServices: Send + Sync + 'static {
    /// Insert, overwrite or leave untouched any capability binding.
    ///
    /// # Errors
    /// A failing provider is isolated under lenient mode: none of its changes are kept.
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()>;
}
