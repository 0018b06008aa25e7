use std::sync::Arc;

use service_locator::{
    LocatorConfig, OverrideServices, Service, ServiceLocator, ServiceMap, capability,
    override_provider, service,
};

#[capability]
pub trait Clock: Service {
    fn now(&self) -> u64;
}

#[service(capabilities = [dyn Clock])]
#[derive(Default)]
pub struct SystemClock;

impl Service for SystemClock {}
impl Clock for SystemClock {
    fn now(&self) -> u64 {
        1
    }
}

pub struct FrozenClock(u64);

impl Service for FrozenClock {}
impl Clock for FrozenClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[override_provider(ctor = FreezeTime { at: 1_700_000_000 })]
pub struct FreezeTime {
    at: u64,
}

impl OverrideServices for FreezeTime {
    fn override_services(&self, services: &mut ServiceMap) -> anyhow::Result<()> {
        services.insert::<dyn Clock>(Arc::new(FrozenClock(self.at)));
        Ok(())
    }
}

fn main() {
    let locator = ServiceLocator::from_inventory(LocatorConfig::default());
    assert_eq!(locator.get::<dyn Clock>().unwrap().unwrap().now(), 1_700_000_000);
}
