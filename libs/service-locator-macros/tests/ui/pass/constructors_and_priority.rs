use service_locator::{LocatorConfig, Service, ServiceLocator, capability, service};

#[capability]
pub trait Counter: Service {
    fn start(&self) -> u32;
}

#[capability]
pub trait Label: Service {
    fn label(&self) -> String;
}

#[service(capabilities = [dyn Counter], priority = -5)]
#[derive(Default)]
pub struct ZeroCounter;

impl Service for ZeroCounter {}
impl Counter for ZeroCounter {
    fn start(&self) -> u32 {
        0
    }
}

#[service(capabilities = [dyn Counter], priority = 5, ctor = TenCounter::new(10))]
pub struct TenCounter {
    start: u32,
}

impl TenCounter {
    fn new(start: u32) -> Self {
        Self { start }
    }
}

impl Service for TenCounter {}
impl Counter for TenCounter {
    fn start(&self) -> u32 {
        self.start
    }
}

#[service(capabilities = [dyn Label], try_ctor = ParsedLabel::parse("42"))]
pub struct ParsedLabel {
    value: u64,
}

impl ParsedLabel {
    fn parse(raw: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self { value: raw.parse()? })
    }
}

impl Service for ParsedLabel {}
impl Label for ParsedLabel {
    fn label(&self) -> String {
        format!("#{}", self.value)
    }
}

fn main() {
    let locator = ServiceLocator::from_inventory(LocatorConfig::default());

    // Higher priority comes first in catalog order and claims the capability.
    assert_eq!(locator.get::<dyn Counter>().unwrap().unwrap().start(), 10);
    assert_eq!(locator.get::<dyn Label>().unwrap().unwrap().label(), "#42");
}
