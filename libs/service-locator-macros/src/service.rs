use heck::ToShoutySnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::DeriveInput;

use crate::args::ServiceArgs;

/// `#[service(...)]` on a type: a `ServiceEntry` with one binder per capability.
pub fn expand(attr: TokenStream, item: &DeriveInput) -> syn::Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[service] types cannot be generic",
        ));
    }
    let args = ServiceArgs::parse(attr)?;

    let ident = &item.ident;
    let priority = args.priority;
    let binders_static = format_ident!(
        "__{}_CAPABILITY_BINDERS",
        ident.to_string().to_shouty_snake_case()
    );
    let binder_count = args.capabilities.len();

    let binders = args.capabilities.iter().map(|capability| {
        quote! {
            ::service_locator::CapabilityBinder {
                key: ::service_locator::CapabilityKey::capability::<#capability>,
                bind: |instance: &::service_locator::ServiceInstance|
                 -> ::core::option::Option<::service_locator::Binding> {
                    instance.bind_as::<#ident, #capability>(
                        |service: ::std::sync::Arc<#ident>| -> ::std::sync::Arc<#capability> {
                            service
                        },
                    )
                },
            }
        }
    });

    let construct = match (&args.ctor, &args.try_ctor) {
        (Some(ctor), _) => quote! {
            || -> ::service_locator::__private::anyhow::Result<::service_locator::ServiceInstance> {
                ::core::result::Result::Ok(::service_locator::ServiceInstance::new::<#ident>(#ctor))
            }
        },
        (None, Some(try_ctor)) => quote! {
            || -> ::service_locator::__private::anyhow::Result<::service_locator::ServiceInstance> {
                let service: #ident = (#try_ctor)?;
                ::core::result::Result::Ok(::service_locator::ServiceInstance::new(service))
            }
        },
        (None, None) => quote! { ::service_locator::construct_default::<#ident> },
    };

    Ok(quote! {
        #item

        const _: () = {
            static #binders_static: [::service_locator::CapabilityBinder; #binder_count] = [
                #(#binders),*
            ];

            ::service_locator::inventory::submit! {
                ::service_locator::ServiceEntry {
                    type_name: ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident)),
                    priority: #priority,
                    construct: #construct,
                    capabilities: &#binders_static,
                }
            }
        };
    })
}
