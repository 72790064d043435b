// SPDX-License-Identifier: Apache-2.0

//! Derives used by netstate types
//!
//! [JsonDisplay]: `std::fmt::Display` using compact JSON, falling back to
//! Debug output when serialization fails. Simple strings are printed without
//! quotes, so enums like `InterfaceType` display as `linux-bridge`.
//!
//! [JsonDisplayHideSecrets]: Same as [JsonDisplay] but display a clone
//! after invoking `hide_secrets()` on it.
//!
//! [DebugHideSecrets]: `std::fmt::Debug` using the JSON output of a clone
//! with secrets hidden. Type using this derive must not derive `Debug`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

fn json_write_body(
    target: proc_macro2::TokenStream,
) -> proc_macro2::TokenStream {
    quote::quote! {
        match serde_json::to_string(&#target) {
            Ok(s) => {
                if s.matches('"').count() == 2
                    && let Some(stripped) = s
                        .strip_prefix('"')
                        .and_then(|s| s.strip_suffix('"'))
                {
                    write!(f, "{}", stripped)
                } else {
                    write!(f, "{}", s)
                }
            }
            Err(e) => {
                log::error!(
                    "BUG: Failed to convert {:?} into JSON: {e}",
                    #target
                );
                write!(f, "{:?}", #target)
            }
        }
    }
}

#[proc_macro_derive(JsonDisplay)]
pub fn derive_json_display(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let class_name = &input.ident;
    let body = json_write_body(quote::quote!(self));

    let expanded = quote::quote! {
        impl std::fmt::Display for #class_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(JsonDisplayHideSecrets)]
pub fn derive_json_display_hide_secrets(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let class_name = &input.ident;
    let body = json_write_body(quote::quote!(self_clone));

    let expanded = quote::quote! {
        impl std::fmt::Display for #class_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut self_clone = self.clone();
                self_clone.hide_secrets();
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(DebugHideSecrets)]
pub fn derive_debug_hide_secrets(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let class_name = &input.ident;

    // Cannot reuse `json_write_body()` here as its fallback path use Debug
    // which would recurse into this impl.
    let expanded = quote::quote! {
        impl std::fmt::Debug for #class_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut self_clone = self.clone();
                self_clone.hide_secrets();
                match serde_json::to_string(&self_clone) {
                    Ok(s) => write!(f, "{}", s),
                    Err(e) => {
                        log::error!(
                            "BUG: Failed to convert {} into JSON: {e}",
                            stringify!(#class_name)
                        );
                        write!(f, "{}", stringify!(#class_name))
                    }
                }
            }
        }
    };

    TokenStream::from(expanded)
}
