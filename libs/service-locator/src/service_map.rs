//! Ordered capability -> binding map used while bootstrapping.
//!
//! Insertion order is the initialization order. Overwriting a capability keeps its original
//! position, so a provider replacing an earlier override does not reorder initialization.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::binding::{Binding, CapabilityKey, InstanceId};
use crate::contracts::Capability;

/// Mutable binding map handed to override providers.
#[derive(Clone, Default)]
pub struct ServiceMap {
    bindings: IndexMap<CapabilityKey, Binding>,
}

impl ServiceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `service` under capability `C`, replacing any existing binding.
    ///
    /// Returns the replaced binding, if any.
    pub fn insert<C>(&mut self, service: Arc<C>) -> Option<Binding>
    where
        C: ?Sized + Capability,
    {
        self.bind(Binding::new::<C>(service))
    }

    /// Typed handle for capability `C`, if bound.
    #[must_use]
    pub fn get<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Capability,
    {
        self.bindings
            .get(&CapabilityKey::capability::<C>())
            .and_then(Binding::downcast::<C>)
    }

    #[must_use]
    pub fn contains<C>(&self) -> bool
    where
        C: ?Sized + Capability,
    {
        self.contains_key(&CapabilityKey::capability::<C>())
    }

    #[must_use]
    pub fn contains_key(&self, key: &CapabilityKey) -> bool {
        self.bindings.contains_key(key)
    }

    #[must_use]
    pub fn binding(&self, key: &CapabilityKey) -> Option<&Binding> {
        self.bindings.get(key)
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Insert or overwrite; an overwritten capability keeps its position.
    pub(crate) fn bind(&mut self, binding: Binding) -> Option<Binding> {
        self.bindings.insert(*binding.capability(), binding)
    }

    /// First-writer-wins insert. Returns `false` if the capability is already bound.
    pub(crate) fn claim(&mut self, binding: Binding) -> bool {
        match self.bindings.entry(*binding.capability()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(binding);
                true
            }
        }
    }

    /// Drop every binding that points at `instance`, preserving the order of the rest.
    pub(crate) fn remove_instance(&mut self, instance: InstanceId) -> Vec<CapabilityKey> {
        let mut removed = Vec::new();
        self.bindings.retain(|key, binding| {
            let keep = binding.instance_id() != instance;
            if !keep {
                removed.push(*key);
            }
            keep
        });
        removed
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.bindings.values()).finish()
    }
}
