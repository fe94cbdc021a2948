//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations for
//! error enums whose variants carry an `#[error("...")]` attribute.
//!
//! # Usage
//!
//! ```ignore
//! use isovm_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum MyError {
//!     #[error("unknown instruction: {name}")]
//!     UnknownInstruction { name: String },
//!
//!     #[error("io error: {0}")]
//!     Io(String),
//!
//!     #[error("out of memory")]
//!     OutOfMemory,
//! }
//! ```
//!
//! Field interpolation uses `{field_name}` for struct variants and `{0}`,
//! `{1}` for tuple variants. Every field of a variant must appear in its
//! message; an unused field is a compile error in the generated `write!`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derives `Display` and `Error` for an error enum.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums",
        ));
    };

    let display_arms = data_enum
        .variants
        .iter()
        .map(display_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds one `match` arm formatting a variant with its `#[error]` message.
fn display_arm(variant: &syn::Variant) -> syn::Result<proc_macro2::TokenStream> {
    let variant_name = &variant.ident;
    let message = error_message(variant)?;

    let arm = match &variant.fields {
        Fields::Unit => {
            quote! {
                Self::#variant_name => write!(f, #message),
            }
        }
        Fields::Unnamed(fields) => {
            let bindings: Vec<_> = (0..fields.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let format_str = positional_to_named(&message, fields.unnamed.len());
            quote! {
                Self::#variant_name(#(#bindings),*) =>
                    write!(f, #format_str, #(#bindings = #bindings),*),
            }
        }
        Fields::Named(fields) => {
            let bindings: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            quote! {
                Self::#variant_name { #(#bindings),* } =>
                    write!(f, #message, #(#bindings = #bindings),*),
            }
        }
    };

    Ok(arm)
}

/// Extracts the message from a variant's `#[error("...")]` attribute.
fn error_message(variant: &syn::Variant) -> syn::Result<String> {
    for attr in &variant.attrs {
        if attr.path().is_ident("error") {
            let lit = attr.parse_args::<LitStr>().map_err(|_| {
                syn::Error::new_spanned(
                    attr,
                    "expected a string literal, e.g. #[error(\"invalid opcode: {0}\")]",
                )
            })?;
            return Ok(lit.value());
        }
    }

    Err(syn::Error::new_spanned(
        variant,
        format!(
            "missing #[error(\"...\")] attribute on variant `{}`",
            variant.ident
        ),
    ))
}

/// Converts positional format args `{0}`, `{1}` to named args `{f0}`, `{f1}`.
fn positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result.replace(&format!("{{{i}}}"), &format!("{{f{i}}}"));
    }
    result
}
