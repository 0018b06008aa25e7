use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemTrait, TypeParamBound};

/// `#[capability]` on a trait: `Capability for dyn Trait` plus a catalog registration.
pub fn expand(attr: &TokenStream, item: &ItemTrait) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[capability] takes no arguments"));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "capability traits cannot be generic",
        ));
    }
    if !has_service_supertrait(item) {
        return Err(syn::Error::new_spanned(
            &item.ident,
            "capability traits must have `Service` as a supertrait, e.g. `trait Greeter: Service`",
        ));
    }

    let ident = &item.ident;
    Ok(quote! {
        #item

        impl ::service_locator::Capability for dyn #ident {
            fn into_service(
                this: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::service_locator::Service> {
                this
            }
        }

        ::service_locator::inventory::submit! {
            ::service_locator::CapabilityEntry {
                key: ::service_locator::CapabilityKey::capability::<dyn #ident>,
            }
        }
    })
}

/// The supertrait list names `Service` (bare or by path).
fn has_service_supertrait(item: &ItemTrait) -> bool {
    item.supertraits.iter().any(|bound| match bound {
        TypeParamBound::Trait(bound) => bound
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Service"),
        _ => false,
    })
}
