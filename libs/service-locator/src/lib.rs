#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Process-wide service locator.
//!
//! Application code depends on *capabilities* (`dyn Trait` contracts) and never on
//! concrete implementation types. A single bootstrap pass wires everything:
//!
//! 1. foundational services (`LogService`, `FileService`) are installed and initialized;
//! 2. the [`TypeCatalog`] is enumerated into a transient snapshot;
//! 3. overrides are applied (config preferences, then [`OverrideServices`] providers);
//! 4. every capability still unbound is claimed by the first implementation in catalog order;
//! 5. the snapshot is released and every bound instance is initialized once, in insertion order.
//!
//! After bootstrap the binding map is sealed and lookups are plain reads.
//!
//! ```ignore
//! use service_locator::{capability, service, Service};
//!
//! #[capability]
//! pub trait Greeter: Service {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! #[service(capabilities = [dyn Greeter])]
//! #[derive(Default)]
//! struct PlainGreeter;
//!
//! impl Service for PlainGreeter {}
//! impl Greeter for PlainGreeter {
//!     fn greet(&self, name: &str) -> String {
//!         format!("Hello, {name}!")
//!     }
//! }
//!
//! let greeter = service_locator::get::<dyn Greeter>()?.expect("greeter bound");
//! ```

pub mod binding;
pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod context;
pub mod contracts;
pub mod diagnostics;
pub mod error;
pub mod foundation;
pub mod locator;
pub mod registry;
pub mod service_map;

#[cfg(test)]
mod test_support;

pub use binding::{Binding, CapabilityKey, ServiceInstance};
pub use bootstrap::BootstrapReport;
pub use catalog::{
    CapabilityBinder, CapabilityEntry, InventoryCatalog, ProviderEntry, ServiceEntry,
    StaticCatalog, TypeCatalog, TypeDescriptor, construct_default, construct_provider,
};
pub use config::{BootstrapMode, ConfigError, LocatorConfig};
pub use context::ServiceCtx;
pub use contracts::{Capability, OverrideServices, Service};
pub use diagnostics::{BindingOrigin, BootstrapObserver};
pub use error::{BootstrapFailure, LocatorError};
pub use foundation::{FallbackPathFileService, FileService, LogService, TracingLog};
pub use locator::{ServiceLocator, get, get_by_key, get_by_name, global, install, warm_up};
pub use registry::ServiceRegistry;
pub use service_map::ServiceMap;

pub use service_locator_macros::{capability, override_provider, service};

// Re-exported for macro expansions; not part of the public API.
#[doc(hidden)]
pub use inventory;

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
}
