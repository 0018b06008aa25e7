use std::sync::Arc;

/// A failure raised by one component during bootstrap.
///
/// Under lenient mode these are isolated, logged and collected into the
/// [`BootstrapReport`](crate::BootstrapReport); under strict mode the first one aborts bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapFailure {
    #[error("override provider `{provider}` failed: {source:#}")]
    Provider {
        provider: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to construct `{implementation}` for {capabilities}: {source:#}")]
    Construction {
        implementation: &'static str,
        capabilities: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to initialize `{implementation}`: {source:#}")]
    Initialization {
        implementation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("preferred implementation `{implementation}` for capability `{capability}` {reason}")]
    UnknownPreference {
        capability: String,
        implementation: String,
        reason: &'static str,
    },
}

impl BootstrapFailure {
    /// Type (or config entry) the failure is attributed to.
    #[must_use]
    pub fn culprit(&self) -> &str {
        match self {
            Self::Provider { provider: name, .. }
            | Self::Construction {
                implementation: name,
                ..
            }
            | Self::Initialization {
                implementation: name,
                ..
            } => *name,
            Self::UnknownPreference { implementation, .. } => implementation.as_str(),
        }
    }
}

/// Errors surfaced to lookup callers.
///
/// A missing binding is not an error: lookups return `Ok(None)` for it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocatorError {
    /// The requested type is not a capability contract. Always a bug at the call site.
    #[error("type `{type_name}` is not a capability")]
    ContractViolation { type_name: String },

    /// Strict-mode bootstrap aborted; every lookup on this locator reports the same cause.
    #[error("service bootstrap aborted: {0}")]
    Bootstrap(#[source] Arc<BootstrapFailure>),
}
