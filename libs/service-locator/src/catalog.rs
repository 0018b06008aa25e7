//! Type catalog: the statically known registration table the locator discovers from.
//!
//! Registrations are plain data submitted through `inventory` by the `#[capability]`,
//! `#[service]` and `#[override_provider]` attributes:
//!
//! ```ignore
//! inventory::submit! {
//!     ServiceEntry {
//!         type_name: "my_app::PlainGreeter",
//!         priority: 0,
//!         construct: construct_default::<PlainGreeter>,
//!         capabilities: &[CapabilityBinder {
//!             key: CapabilityKey::capability::<dyn Greeter>,
//!             bind: |instance| instance.bind_as::<PlainGreeter, dyn Greeter>(|s| s),
//!         }],
//!     }
//! }
//! ```
//!
//! The locator only sees a [`TypeCatalog`]; tests and embedders can hand it a
//! [`StaticCatalog`] with an explicit order instead of the global table.

use std::cmp::Reverse;
use std::fmt;

use crate::binding::{Binding, CapabilityKey, ServiceInstance, short_name};
use crate::contracts::{OverrideServices, Service};

/// Declared capability contract.
pub struct CapabilityEntry {
    pub key: fn() -> CapabilityKey,
}

/// One capability an implementation satisfies, with the coercion that binds it.
pub struct CapabilityBinder {
    pub key: fn() -> CapabilityKey,
    pub bind: fn(&ServiceInstance) -> Option<Binding>,
}

/// Concrete, zero-argument-constructible implementation.
pub struct ServiceEntry {
    /// Fully-qualified type name.
    pub type_name: &'static str,
    /// Higher runs first in catalog order.
    pub priority: i32,
    pub construct: fn() -> anyhow::Result<ServiceInstance>,
    pub capabilities: &'static [CapabilityBinder],
}

impl ServiceEntry {
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        short_name(self.type_name)
    }

    /// Matches the fully-qualified or the short type name, ignoring ASCII case.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(name) || self.short_name().eq_ignore_ascii_case(name)
    }

    pub fn capability_keys(&self) -> impl Iterator<Item = CapabilityKey> + '_ {
        self.capabilities.iter().map(|binder| (binder.key)())
    }

    #[must_use]
    pub fn binder(&self, key: &CapabilityKey) -> Option<&CapabilityBinder> {
        self.capabilities.iter().find(|binder| (binder.key)() == *key)
    }
}

/// Zero-argument-constructible override provider.
pub struct ProviderEntry {
    pub type_name: &'static str,
    /// Higher runs first in catalog order.
    pub priority: i32,
    pub construct: fn() -> anyhow::Result<Box<dyn OverrideServices>>,
}

inventory::collect!(CapabilityEntry);
inventory::collect!(ServiceEntry);
inventory::collect!(ProviderEntry);

/// Default construction for `#[service]` registrations.
///
/// # Errors
/// Never fails; the signature matches fallible constructors.
#[allow(clippy::unnecessary_wraps)]
pub fn construct_default<S: Service + Default>() -> anyhow::Result<ServiceInstance> {
    Ok(ServiceInstance::new(S::default()))
}

/// Default construction for `#[override_provider]` registrations.
///
/// # Errors
/// Never fails; the signature matches fallible constructors.
#[allow(clippy::unnecessary_wraps)]
pub fn construct_provider<P: OverrideServices + Default>()
-> anyhow::Result<Box<dyn OverrideServices>> {
    Ok(Box::new(P::default()))
}

/// One entry of a catalog snapshot.
#[derive(Clone, Copy)]
pub enum TypeDescriptor {
    Capability(&'static CapabilityEntry),
    Service(&'static ServiceEntry),
    Provider(&'static ProviderEntry),
}

impl TypeDescriptor {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Capability(entry) => (entry.key)().name(),
            Self::Service(entry) => entry.type_name,
            Self::Provider(entry) => entry.type_name,
        }
    }

    /// Abstract capability contract.
    #[must_use]
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Capability(_))
    }

    /// Concrete implementation the locator may default-construct and bind.
    #[must_use]
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    #[must_use]
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider(_))
    }

    /// Capabilities this type satisfies; empty for contracts and providers.
    #[must_use]
    pub fn capabilities(&self) -> Vec<CapabilityKey> {
        match self {
            Self::Service(entry) => entry.capability_keys().collect(),
            Self::Capability(_) | Self::Provider(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn as_service(&self) -> Option<&'static ServiceEntry> {
        match *self {
            Self::Service(entry) => Some(entry),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_provider(&self) -> Option<&'static ProviderEntry> {
        match *self {
            Self::Provider(entry) => Some(entry),
            _ => None,
        }
    }

    fn priority(&self) -> i32 {
        match self {
            Self::Capability(_) => 0,
            Self::Service(entry) => entry.priority,
            Self::Provider(entry) => entry.priority,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Capability(_) => "capability",
            Self::Service(_) => "service",
            Self::Provider(_) => "provider",
        };
        write!(f, "{kind}:{}", self.type_name())
    }
}

/// Source of every candidate type visible at startup.
///
/// Queried once per bootstrap; the locator neither caches nor invalidates the result.
pub trait TypeCatalog: Send + Sync {
    fn enumerate(&self) -> Vec<TypeDescriptor>;
}

/// Catalog backed by the link-time `inventory` registration table.
///
/// `inventory` yields entries in an unspecified order, so the snapshot is sorted by
/// `priority` (descending) and then by type name. The result is stable across runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryCatalog;

impl TypeCatalog for InventoryCatalog {
    fn enumerate(&self) -> Vec<TypeDescriptor> {
        let mut types: Vec<TypeDescriptor> = inventory::iter::<CapabilityEntry>()
            .map(TypeDescriptor::Capability)
            .chain(inventory::iter::<ProviderEntry>().map(TypeDescriptor::Provider))
            .chain(inventory::iter::<ServiceEntry>().map(TypeDescriptor::Service))
            .collect();
        sort_stable(&mut types);
        types
    }
}

fn sort_stable(types: &mut [TypeDescriptor]) {
    types.sort_by_key(|descriptor| (Reverse(descriptor.priority()), descriptor.type_name()));
}

/// Catalog with a fixed, caller-defined order.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    types: Vec<TypeDescriptor>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(types: Vec<TypeDescriptor>) -> Self {
        Self { types }
    }

    #[must_use]
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }
}

impl TypeCatalog for StaticCatalog {
    fn enumerate(&self) -> Vec<TypeDescriptor> {
        self.types.clone()
    }
}
