use service_locator::{LocatorConfig, Service, ServiceLocator, capability, service};

#[capability]
pub trait Greeter: Service {
    fn greet(&self, name: &str) -> String;
}

#[capability]
pub trait Farewell: Service {
    fn bye(&self) -> &'static str;
}

#[service(capabilities = [dyn Greeter, dyn Farewell])]
#[derive(Default)]
pub struct Polite;

impl Service for Polite {}

impl Greeter for Polite {
    fn greet(&self, name: &str) -> String {
        format!("Good day, {name}.")
    }
}

impl Farewell for Polite {
    fn bye(&self) -> &'static str {
        "Farewell."
    }
}

fn main() {
    let locator = ServiceLocator::from_inventory(LocatorConfig::default());

    let greeter = locator.get::<dyn Greeter>().unwrap().expect("greeter bound");
    assert_eq!(greeter.greet("Ada"), "Good day, Ada.");

    let farewell = locator.get_by_name("Farewell").unwrap().expect("farewell bound");
    assert_eq!(farewell.downcast::<dyn Farewell>().unwrap().bye(), "Farewell.");
}
