//! `key = value` argument parsing shared by the registration attributes.

use std::collections::HashSet;

use proc_macro2::{Span, TokenStream};
use quote::ToTokens;
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{Expr, LitInt, Token, Type};

pub const SERVICE_KEYS: &[&str] = &["capabilities", "priority", "ctor", "try_ctor"];
pub const PROVIDER_KEYS: &[&str] = &["priority", "ctor"];

/// Arguments of `#[service(...)]`.
#[derive(Default)]
pub struct ServiceArgs {
    pub capabilities: Vec<Type>,
    pub priority: i32,
    pub ctor: Option<Expr>,
    pub try_ctor: Option<Expr>,
}

impl ServiceArgs {
    pub fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = Self::default();
        parse_args(attr, |key, meta| {
            match key {
                "capabilities" => args.capabilities = parse_capabilities(meta)?,
                "priority" => args.priority = parse_priority(meta)?,
                "ctor" => args.ctor = Some(meta.value()?.parse()?),
                "try_ctor" => args.try_ctor = Some(meta.value()?.parse()?),
                other => return Err(unknown_argument(meta, other, SERVICE_KEYS)),
            }
            Ok(())
        })?;

        if args.capabilities.is_empty() {
            return Err(syn::Error::new(
                Span::call_site(),
                "#[service] requires at least one capability: `capabilities = [dyn Trait, ...]`",
            ));
        }
        if let (Some(_), Some(try_ctor)) = (&args.ctor, &args.try_ctor) {
            return Err(syn::Error::new_spanned(
                try_ctor,
                "`ctor` and `try_ctor` are mutually exclusive",
            ));
        }
        Ok(args)
    }
}

/// Arguments of `#[override_provider(...)]`.
#[derive(Default)]
pub struct ProviderArgs {
    pub priority: i32,
    pub ctor: Option<Expr>,
}

impl ProviderArgs {
    pub fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = Self::default();
        parse_args(attr, |key, meta| {
            match key {
                "priority" => args.priority = parse_priority(meta)?,
                "ctor" => args.ctor = Some(meta.value()?.parse()?),
                other => return Err(unknown_argument(meta, other, PROVIDER_KEYS)),
            }
            Ok(())
        })?;
        Ok(args)
    }
}

/// Walk `key = value` pairs, rejecting duplicate keys before `on_arg` sees them.
fn parse_args(
    attr: TokenStream,
    mut on_arg: impl FnMut(&str, &ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    let mut seen = HashSet::new();
    let parser = syn::meta::parser(|meta| {
        let key = meta.path.to_token_stream().to_string().replace(' ', "");
        if !seen.insert(key.clone()) {
            return Err(meta.error(format!("duplicate argument '{key}'")));
        }
        on_arg(&key, &meta)
    });
    syn::parse::Parser::parse2(parser, attr)
}

fn unknown_argument(meta: &ParseNestedMeta, key: &str, allowed: &[&str]) -> syn::Error {
    let suggestion = allowed
        .iter()
        .map(|candidate| (strsim::jaro_winkler(key, candidate), candidate))
        .filter(|(score, _)| *score > 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| format!(" (did you mean '{candidate}'?)"))
        .unwrap_or_default();
    meta.error(format!(
        "unknown argument '{key}'{suggestion}; expected one of: {}",
        allowed.join(", ")
    ))
}

/// `[dyn A, dyn B]`; every entry must be a trait object and appear once.
fn parse_capabilities(meta: &ParseNestedMeta) -> syn::Result<Vec<Type>> {
    let value = meta.value()?;
    let content;
    syn::bracketed!(content in value);
    let list = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;

    let mut seen = HashSet::new();
    let mut capabilities = Vec::with_capacity(list.len());
    for ty in list {
        if !matches!(ty, Type::TraitObject(_)) {
            return Err(syn::Error::new_spanned(
                &ty,
                "capabilities must be trait objects, e.g. `dyn Greeter`",
            ));
        }
        let rendered = ty.to_token_stream().to_string();
        if !seen.insert(rendered.clone()) {
            return Err(syn::Error::new_spanned(
                &ty,
                format!("capability `{rendered}` is listed twice"),
            ));
        }
        capabilities.push(ty);
    }
    Ok(capabilities)
}

/// Integer literal with an optional leading minus.
fn parse_priority(meta: &ParseNestedMeta) -> syn::Result<i32> {
    let value = meta.value()?;
    let negative = value.parse::<Option<Token![-]>>()?.is_some();
    let lit: LitInt = value.parse()?;
    let magnitude: i32 = lit.base10_parse()?;
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn service_args_full_set() {
        let args = ServiceArgs::parse(quote!(
            capabilities = [dyn Greeter, dyn Journal],
            priority = -3,
            ctor = PlainGreeter::new()
        ))
        .unwrap();

        assert_eq!(args.capabilities.len(), 2);
        assert_eq!(args.priority, -3);
        assert!(args.ctor.is_some());
        assert!(args.try_ctor.is_none());
    }

    #[test]
    fn service_args_default_priority_and_ctor() {
        let args = ServiceArgs::parse(quote!(capabilities = [dyn Greeter])).unwrap();
        assert_eq!(args.priority, 0);
        assert!(args.ctor.is_none());
    }

    #[test]
    fn service_requires_capabilities() {
        let err = ServiceArgs::parse(quote!(priority = 1)).err().unwrap();
        assert!(err.to_string().contains("requires at least one capability"));

        let err = ServiceArgs::parse(quote!(capabilities = [])).err().unwrap();
        assert!(err.to_string().contains("requires at least one capability"));
    }

    #[test]
    fn service_rejects_non_trait_object_capability() {
        let err = ServiceArgs::parse(quote!(capabilities = [Greeter]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("must be trait objects"));
    }

    #[test]
    fn service_rejects_repeated_capability() {
        let err = ServiceArgs::parse(quote!(capabilities = [dyn Greeter, dyn Greeter]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn service_rejects_both_constructors() {
        let err = ServiceArgs::parse(quote!(
            capabilities = [dyn Greeter],
            ctor = A::new(),
            try_ctor = A::open()
        ))
        .err()
        .unwrap();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn duplicate_argument_is_rejected() {
        let err = ServiceArgs::parse(quote!(
            capabilities = [dyn Greeter],
            priority = 1,
            priority = 2
        ))
        .err()
        .unwrap();
        assert!(err.to_string().contains("duplicate argument 'priority'"));
    }

    #[test]
    fn unknown_argument_suggests_closest_key() {
        let err = ServiceArgs::parse(quote!(capabilites = [dyn Greeter]))
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("unknown argument 'capabilites'"));
        assert!(err.contains("did you mean 'capabilities'?"));
    }

    #[test]
    fn provider_args() {
        let args = ProviderArgs::parse(quote!(priority = 10, ctor = Overrides::new())).unwrap();
        assert_eq!(args.priority, 10);
        assert!(args.ctor.is_some());

        let err = ProviderArgs::parse(quote!(capabilities = [dyn Greeter]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("expected one of: priority, ctor"));
    }
}
