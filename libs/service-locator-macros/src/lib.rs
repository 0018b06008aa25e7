//! Registration attributes for `service_locator`.
//!
//! Each attribute leaves the annotated item untouched and submits a catalog entry through
//! `inventory`, so implementations are discovered without a hand-maintained list.

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemTrait, parse_macro_input};

mod args;
mod capability;
mod provider;
mod service;

/// Declare a capability contract.
///
/// ```ignore
/// #[capability]
/// pub trait Greeter: Service {
///     fn greet(&self, name: &str) -> String;
/// }
/// ```
#[proc_macro_attribute]
pub fn capability(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = parse_macro_input!(item as ItemTrait);
    capability::expand(&attr, &item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Register a default-constructible implementation.
///
/// ```ignore
/// #[service(capabilities = [dyn Greeter, dyn Journal], priority = 10)]
/// #[derive(Default)]
/// pub struct PlainGreeter;
///
/// #[service(capabilities = [dyn Journal], try_ctor = FileJournal::open())]
/// pub struct FileJournal { /* ... */ }
/// ```
///
/// - `capabilities` (required): trait objects of `#[capability]` traits the type implements.
/// - `priority` (default 0): higher runs earlier in catalog order.
/// - `ctor = expr`: infallible constructor expression, instead of `Default::default()`.
/// - `try_ctor = expr`: fallible constructor expression returning `Result<Self, E>`.
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = parse_macro_input!(item as DeriveInput);
    service::expand(attr, &item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Register an `OverrideServices` provider.
///
/// ```ignore
/// #[override_provider(priority = 5)]
/// #[derive(Default)]
/// pub struct DemoOverrides;
/// ```
#[proc_macro_attribute]
pub fn override_provider(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = parse_macro_input!(item as DeriveInput);
    provider::expand(attr, &item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
