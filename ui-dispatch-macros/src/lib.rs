//! Procedural macros for ui-dispatch

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Marker)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(marker), supports(enum_unit))]
struct MarkerOpts {
    ident: syn::Ident,
    data: darling::ast::Data<MarkerVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(marker))]
struct MarkerVariant {
    ident: syn::Ident,

    /// Explicit name override
    #[darling(default)]
    rename: Option<String>,
}

/// Split a PascalCase string into parts
fn split_pascal_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            parts.push(current);
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Convert PascalCase to kebab-case
fn to_kebab_case(s: &str) -> String {
    split_pascal_case(s)
        .iter()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Derive macro for the Marker trait
///
/// Generates implementations for `name()`, `from_name()`, and `all()` methods.
/// The name is derived from the variant name converted to kebab-case, or
/// taken from `#[marker(rename = "...")]`.
///
/// # Example
/// ```ignore
/// #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum LearningAction {
///     PageReload,
///     ModuleModalShow,
///     #[marker(rename = "call-function")]
///     CallFn,
/// }
///
/// // Generated names: "page-reload", "module-modal-show", "call-function"
/// assert_eq!(LearningAction::PageReload.name(), "page-reload");
/// assert_eq!(LearningAction::from_name("call-function"), Some(LearningAction::CallFn));
/// ```
#[proc_macro_derive(Marker, attributes(marker))]
pub fn derive_marker(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match MarkerOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Marker can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&input, "Marker needs at least one variant")
            .to_compile_error()
            .into();
    }

    let variant_names: Vec<_> = variants.iter().map(|v| &v.ident).collect();
    let variant_strings: Vec<String> = variants
        .iter()
        .map(|v| {
            v.rename
                .clone()
                .unwrap_or_else(|| to_kebab_case(&v.ident.to_string()))
        })
        .collect();

    // Two variants answering to the same name would make from_name ambiguous
    let mut seen: HashMap<&str, &syn::Ident> = HashMap::new();
    for (variant, string) in variant_names.iter().zip(variant_strings.iter()) {
        if string.is_empty() {
            return syn::Error::new_spanned(variant, "Marker names must not be empty")
                .to_compile_error()
                .into();
        }
        if let Some(previous) = seen.insert(string.as_str(), variant) {
            return syn::Error::new_spanned(
                variant,
                format!("marker name {string:?} is already used by `{previous}`"),
            )
            .to_compile_error()
            .into();
        }
    }

    let name_arms = variant_names
        .iter()
        .zip(variant_strings.iter())
        .map(|(v, s)| {
            quote! { #name::#v => #s }
        });

    let from_name_arms = variant_names
        .iter()
        .zip(variant_strings.iter())
        .map(|(v, s)| {
            quote! { #s => ::core::option::Option::Some(#name::#v) }
        });

    let all_variants = variant_names.iter().map(|v| quote! { #name::#v });

    let expanded = quote! {
        impl ::ui_dispatch::Marker for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }

            fn from_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #(#from_name_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn all() -> &'static [Self] {
                static ALL: &[#name] = &[#(#all_variants),*];
                ALL
            }
        }
    };

    TokenStream::from(expanded)
}
