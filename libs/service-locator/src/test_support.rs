//! Shared fixtures for unit tests: two capabilities, a handful of implementations with
//! well-known failure modes, and a recording observer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::binding::{Binding, CapabilityKey, ServiceInstance, short_name};
use crate::catalog::{
    CapabilityBinder, CapabilityEntry, ProviderEntry, ServiceEntry, construct_default,
    construct_provider,
};
use crate::context::ServiceCtx;
use crate::contracts::{Capability, OverrideServices, Service};
use crate::diagnostics::{BindingOrigin, BootstrapObserver};
use crate::error::BootstrapFailure;
use crate::foundation::LogService;
use crate::service_map::ServiceMap;

macro_rules! capability {
    ($name:ident) => {
        pub trait $name: Service {
            fn id(&self) -> &'static str;
        }
        impl Capability for dyn $name {
            fn into_service(this: Arc<Self>) -> Arc<dyn Service> {
                this
            }
        }
    };
}

capability!(CapX);
capability!(CapY);
capability!(CapZ);

macro_rules! service_entry {
    ($entry:ident: $ty:ident => [$($cap:ident),*]) => {
        service_entry!($entry: $ty, construct_default::<$ty> => [$($cap),*]);
    };
    ($entry:ident: $ty:ident, $ctor:expr => [$($cap:ident),*]) => {
        pub static $entry: ServiceEntry = ServiceEntry {
            type_name: stringify!($ty),
            priority: 0,
            construct: $ctor,
            capabilities: &[$(CapabilityBinder {
                key: CapabilityKey::capability::<dyn $cap>,
                bind: |instance: &ServiceInstance| -> Option<Binding> {
                    instance.bind_as::<$ty, dyn $cap>(|s: Arc<$ty>| -> Arc<dyn $cap> { s })
                },
            }),*],
        };
    };
}

macro_rules! simple_service {
    ($ty:ident, $id:literal => [$($cap:ident),*]) => {
        #[derive(Debug, Default)]
        pub struct $ty;
        impl Service for $ty {}
        $(impl $cap for $ty {
            fn id(&self) -> &'static str {
                $id
            }
        })*
    };
}

simple_service!(A, "a" => [CapX]);
simple_service!(B, "b" => [CapX]);
simple_service!(C, "c" => [CapY]);
simple_service!(Both, "both" => [CapX, CapY]);
simple_service!(OverrideY, "override-y" => [CapY]);
simple_service!(FailingCtor, "failing-ctor" => [CapX]);
simple_service!(PanickingCtor, "panicking-ctor" => [CapX]);

/// `CapX` whose initialize requires `CapY` to already be bound.
#[derive(Debug, Default)]
pub struct NeedsY;
impl Service for NeedsY {
    fn initialize(&self, ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        anyhow::ensure!(ctx.get::<dyn CapY>().is_some(), "CapY is not bound yet");
        Ok(())
    }
}
impl CapX for NeedsY {
    fn id(&self) -> &'static str {
        "needs-y"
    }
}

/// `CapY` whose initialize always fails.
#[derive(Debug, Default)]
pub struct BrokenInit;
impl Service for BrokenInit {
    fn initialize(&self, _ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        anyhow::bail!("disk is read-only")
    }
}
impl CapY for BrokenInit {
    fn id(&self) -> &'static str {
        "broken-init"
    }
}

/// Fan-out implementation whose initialize fails.
#[derive(Debug, Default)]
pub struct BrokenBoth;
impl Service for BrokenBoth {
    fn initialize(&self, _ctx: &ServiceCtx<'_>) -> anyhow::Result<()> {
        anyhow::bail!("both halves broken")
    }
}
impl CapX for BrokenBoth {
    fn id(&self) -> &'static str {
        "broken-both"
    }
}
impl CapY for BrokenBoth {
    fn id(&self) -> &'static str {
        "broken-both"
    }
}

/// Log service override that silently drops everything.
#[derive(Debug, Default)]
pub struct QuietLog;
impl Service for QuietLog {}
impl LogService for QuietLog {
    fn log(&self, _level: tracing::Level, _context: &str, _message: &str) {}
}

/// Messages written through [`CapturingLog`], as `LEVEL message`.
pub static CAPTURED_LOG: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Log service override that records into [`CAPTURED_LOG`].
#[derive(Debug, Default)]
pub struct CapturingLog;
impl Service for CapturingLog {}
impl LogService for CapturingLog {
    fn log(&self, level: tracing::Level, _context: &str, message: &str) {
        CAPTURED_LOG.lock().push(format!("{level} {message}"));
    }
}

pub fn failing_ctor() -> anyhow::Result<ServiceInstance> {
    anyhow::bail!("connection refused")
}

pub fn panicking_ctor() -> anyhow::Result<ServiceInstance> {
    panic!("constructor exploded")
}

service_entry!(A_ENTRY: A => [CapX]);
service_entry!(B_ENTRY: B => [CapX]);
service_entry!(C_ENTRY: C => [CapY]);
service_entry!(BOTH_ENTRY: Both => [CapX, CapY]);
service_entry!(NEEDS_Y_ENTRY: NeedsY => [CapX]);
service_entry!(BROKEN_INIT_ENTRY: BrokenInit => [CapY]);
service_entry!(BROKEN_BOTH_ENTRY: BrokenBoth => [CapX, CapY]);
service_entry!(FAILING_CTOR_ENTRY: FailingCtor, failing_ctor => [CapX]);
service_entry!(PANICKING_CTOR_ENTRY: PanickingCtor, panicking_ctor => [CapX]);

pub static CAP_Z_ENTRY: CapabilityEntry = CapabilityEntry {
    key: CapabilityKey::capability::<dyn CapZ>,
};

/// Binds `CapX -> B`.
#[derive(Debug, Default)]
pub struct PreferB;
impl OverrideServices for PreferB {
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()> {
        services.insert::<dyn CapX>(Arc::new(B));
        Ok(())
    }
}

/// Binds `CapY -> OverrideY`, then fails.
#[derive(Debug, Default)]
pub struct HalfDone;
impl OverrideServices for HalfDone {
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()> {
        services.insert::<dyn CapY>(Arc::new(OverrideY));
        anyhow::bail!("lost connection to settings store")
    }
}

#[derive(Debug, Default)]
pub struct Panicking;
impl OverrideServices for Panicking {
    fn override_services(&self, _services: &mut ServiceMap) -> anyhow::Result<()> {
        panic!("provider exploded")
    }
}

/// Replaces the foundational log service.
#[derive(Debug, Default)]
pub struct SwapLog;
impl OverrideServices for SwapLog {
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()> {
        services.insert::<dyn LogService>(Arc::new(QuietLog));
        Ok(())
    }
}

/// Replaces the foundational log service with [`CapturingLog`].
#[derive(Debug, Default)]
pub struct CaptureLog;
impl OverrideServices for CaptureLog {
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()> {
        services.insert::<dyn LogService>(Arc::new(CapturingLog));
        Ok(())
    }
}

pub static PREFER_B: ProviderEntry = ProviderEntry {
    type_name: "PreferB",
    priority: 0,
    construct: construct_provider::<PreferB>,
};

pub static HALF_DONE: ProviderEntry = ProviderEntry {
    type_name: "HalfDone",
    priority: 0,
    construct: construct_provider::<HalfDone>,
};

pub static PANICKING: ProviderEntry = ProviderEntry {
    type_name: "Panicking",
    priority: 0,
    construct: construct_provider::<Panicking>,
};

pub static SWAP_LOG: ProviderEntry = ProviderEntry {
    type_name: "SwapLog",
    priority: 0,
    construct: construct_provider::<SwapLog>,
};

pub static CAPTURE_LOG: ProviderEntry = ProviderEntry {
    type_name: "CaptureLog",
    priority: 0,
    construct: construct_provider::<CaptureLog>,
};

/// Observer that records every event as a short line, e.g. `bind CapX -> A (Discovered)`.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| event.strip_prefix(prefix))
            .map(str::to_owned)
            .collect()
    }

    pub fn constructed(&self) -> Vec<String> {
        self.with_prefix("construct ")
    }

    pub fn initialized(&self) -> Vec<String> {
        self.with_prefix("init ")
    }

    pub fn failures(&self) -> Vec<String> {
        self.with_prefix("fail ")
    }
}

impl BootstrapObserver for Recorder {
    fn on_constructed(&self, implementation: &'static str) {
        self.events
            .lock()
            .push(format!("construct {}", short_name(implementation)));
    }

    fn on_bound(&self, capability: &CapabilityKey, implementation: &'static str, origin: BindingOrigin) {
        self.events.lock().push(format!(
            "bind {} -> {} ({origin:?})",
            capability.short_name(),
            short_name(implementation)
        ));
    }

    fn on_initialized(&self, implementation: &'static str) {
        self.events
            .lock()
            .push(format!("init {}", short_name(implementation)));
    }

    fn on_failure(&self, failure: &BootstrapFailure) {
        self.events
            .lock()
            .push(format!("fail {}", short_name(failure.culprit())));
    }
}
