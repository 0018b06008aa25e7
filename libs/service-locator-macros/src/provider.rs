use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::args::ProviderArgs;

/// `#[override_provider(...)]` on a type implementing `OverrideServices`.
pub fn expand(attr: TokenStream, item: &DeriveInput) -> syn::Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[override_provider] types cannot be generic",
        ));
    }
    let args = ProviderArgs::parse(attr)?;

    let ident = &item.ident;
    let priority = args.priority;
    let construct = match &args.ctor {
        Some(ctor) => quote! {
            || -> ::service_locator::__private::anyhow::Result<
                ::std::boxed::Box<dyn ::service_locator::OverrideServices>,
            > {
                let provider: #ident = #ctor;
                ::core::result::Result::Ok(::std::boxed::Box::new(provider))
            }
        },
        None => quote! { ::service_locator::construct_provider::<#ident> },
    };

    Ok(quote! {
        #item

        ::service_locator::inventory::submit! {
            ::service_locator::ProviderEntry {
                type_name: ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident)),
                priority: #priority,
                construct: #construct,
            }
        }
    })
}
