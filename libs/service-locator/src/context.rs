use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::binding::short_name;
use crate::config::{ConfigError, LocatorConfig, service_config_or_default, service_config_required};
use crate::contracts::Capability;
use crate::service_map::ServiceMap;

/// Context handed to [`Service::initialize`](crate::Service::initialize).
///
/// The map is complete when initialization starts: every binding override providers and
/// auto-binding produced is visible, including capabilities bound to implementations that
/// have not been initialized yet.
pub struct ServiceCtx<'a> {
    services: &'a ServiceMap,
    config: &'a LocatorConfig,
    implementation: &'static str,
}

impl<'a> ServiceCtx<'a> {
    pub(crate) fn new(
        services: &'a ServiceMap,
        config: &'a LocatorConfig,
        implementation: &'static str,
    ) -> Self {
        Self {
            services,
            config,
            implementation,
        }
    }

    /// Resolve another capability from the bootstrap map.
    #[must_use]
    pub fn get<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Capability,
    {
        self.services.get::<C>()
    }

    #[must_use]
    pub fn services(&self) -> &'a ServiceMap {
        self.services
    }

    /// Fully-qualified type name of the implementation being initialized.
    #[must_use]
    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    #[must_use]
    pub fn locator_config(&self) -> &'a LocatorConfig {
        self.config
    }

    /// This implementation's `services.<ShortName>` section, or `T::default()` if absent.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidServiceConfig` if the section is present but malformed.
    pub fn config_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        service_config_or_default(self.config, short_name(self.implementation))
    }

    /// This implementation's `services.<ShortName>` section; it must be present.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingServiceConfig` or `ConfigError::InvalidServiceConfig`.
    pub fn config_required<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        service_config_required(self.config, short_name(self.implementation))
    }
}

impl std::fmt::Debug for ServiceCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCtx")
            .field("implementation", &self.implementation)
            .field("bound", &self.services.len())
            .finish_non_exhaustive()
    }
}
