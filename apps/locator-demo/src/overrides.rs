use std::sync::Arc;

use service_locator::{OverrideServices, ServiceMap, override_provider};

use crate::services::{Journal, MemoryJournal};

/// Set to any non-empty value to keep the journal in memory.
pub const EPHEMERAL_JOURNAL_ENV: &str = "LOCATOR_DEMO_EPHEMERAL_JOURNAL";

/// Swaps the file journal for an in-memory one when [`EPHEMERAL_JOURNAL_ENV`] is set.
#[override_provider(ctor = EphemeralJournal::from_env())]
pub struct EphemeralJournal {
    enabled: bool,
}

impl EphemeralJournal {
    fn from_env() -> Self {
        let enabled = std::env::var_os(EPHEMERAL_JOURNAL_ENV).is_some_and(|value| !value.is_empty());
        Self { enabled }
    }
}

impl OverrideServices for EphemeralJournal {
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()> {
        if self.enabled {
            tracing::debug!("binding in-memory journal");
            services.insert::<dyn Journal>(Arc::new(MemoryJournal::default()));
        }
        Ok(())
    }
}
