//! Capability keys, bindings and constructed instances.
//!
//! Implementation details:
//! - Key = `TypeId` of the capability type (`dyn Trait`), plus `type_name` for diagnostics.
//! - A binding stores the capability handle `Arc<C>` as `Arc<dyn Any + Send + Sync>` and
//!   downcasts on read; the same instance is also kept as `Arc<dyn Service>` for lifecycle calls.
//! - Bindings are cheap to clone: every clone points to the same instance.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contracts::{Capability, Service};

/// Runtime token identifying a capability type.
#[derive(Clone, Copy)]
pub struct CapabilityKey {
    id: TypeId,
    name: &'static str,
    capability: bool,
}

impl CapabilityKey {
    /// Key for any type. Carries no proof that `T` is a capability: lookups accept it only if
    /// the locator declared that capability.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            capability: false,
        }
    }

    /// Key for a capability type; always accepted by runtime lookups, declared or not.
    #[inline]
    #[must_use]
    pub fn capability<C: ?Sized + Capability>() -> Self {
        Self {
            capability: true,
            ..Self::of::<C>()
        }
    }

    /// Whether the key was built from a `Capability` type.
    #[must_use]
    pub fn is_capability(&self) -> bool {
        self.capability
    }

    /// Fully-qualified type name, e.g. `dyn my_app::Greeter`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Trait name without `dyn` and module path, e.g. `Greeter`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        short_name(self.name)
    }

    /// Matches either the fully-qualified or the short name, ignoring ASCII case.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.short_name().eq_ignore_ascii_case(name)
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Strip `dyn `, generic arguments and the module path from a type name.
pub(crate) fn short_name(type_name: &str) -> &str {
    let name = type_name.strip_prefix("dyn ").unwrap_or(type_name);
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

/// Identity of a bound instance; equal for every capability the instance was bound under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct InstanceId(usize);

/// A capability resolved to one implementation instance.
#[derive(Clone)]
pub struct Binding {
    capability: CapabilityKey,
    implementation: &'static str,
    // Holds exactly `Arc<C>` for `C` = the capability type.
    handle: Arc<dyn Any + Send + Sync>,
    service: Arc<dyn Service>,
}

impl Binding {
    /// Bind `service` under capability `C`.
    pub fn new<C>(service: Arc<C>) -> Self
    where
        C: ?Sized + Capability,
    {
        let lifecycle = C::into_service(Arc::clone(&service));
        Self {
            capability: CapabilityKey::capability::<C>(),
            implementation: lifecycle.service_name(),
            handle: Arc::new(service),
            service: lifecycle,
        }
    }

    #[must_use]
    pub fn capability(&self) -> &CapabilityKey {
        &self.capability
    }

    /// Concrete type name of the bound instance.
    #[must_use]
    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    /// The bound instance through its lifecycle contract.
    #[must_use]
    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    /// Typed handle; `None` when `C` is not the capability this binding was created for.
    #[must_use]
    pub fn downcast<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Capability,
    {
        self.handle.downcast_ref::<Arc<C>>().cloned()
    }

    pub(crate) fn instance_id(&self) -> InstanceId {
        InstanceId(Arc::as_ptr(&self.service).cast::<()>().addr())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("capability", &self.capability)
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}

/// A freshly constructed implementation, not yet bound to any capability.
///
/// Every binding produced from one instance shares it, so an implementation claiming several
/// capabilities is constructed and initialized once.
#[derive(Clone)]
pub struct ServiceInstance {
    implementation: &'static str,
    concrete: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
    pub fn new<S: Service>(service: S) -> Self {
        Self {
            implementation: std::any::type_name::<S>(),
            concrete: Arc::new(service),
        }
    }

    #[must_use]
    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    /// Bind this instance under capability `C`.
    ///
    /// `upcast` performs the unsizing coercion `Arc<S> -> Arc<C>`; registration macros pass
    /// `|s| s`. Returns `None` when the instance is not an `S`.
    pub fn bind_as<S, C>(&self, upcast: fn(Arc<S>) -> Arc<C>) -> Option<Binding>
    where
        S: Service,
        C: ?Sized + Capability,
    {
        let concrete = Arc::clone(&self.concrete).downcast::<S>().ok()?;
        Some(Binding::new::<C>(upcast(concrete)))
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}
