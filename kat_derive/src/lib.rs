#![recursion_limit = "128"]

extern crate proc_macro;

/// Parsing of `#[kat(...)]` attributes.
mod attr;
/// Support for struct auto-derive.
mod struct_impl;

use proc_macro::TokenStream;
use syn::{parse_macro_input, Data, DeriveInput, Error};

/// Derives `KatRep` and `Embed` for a struct.
///
/// Container attributes:
///
/// * `#[kat(name = "User")]` - The entity name. Defaults to the struct name.
/// * `#[kat(sealed)]` - Reject unknown fields instead of skipping them.
///
/// Field attributes:
///
/// * `#[kat(rename = "id")]` - The primary name. Defaults to the field name.
/// * `#[kat(alias = "uid")]` - An extra accepted name; may be repeated.
/// * `#[kat(skip)]` - Leave the field out of the spec.
#[proc_macro_derive(KatRep, attributes(kat))]
pub fn kat_rep_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    impl_kat_rep_macro(&ast)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn impl_kat_rep_macro(ast: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    match &ast.data {
        Data::Struct(sd) => struct_impl::kat_rep(ast, sd),
        _ => Err(Error::new_spanned(
            &ast.ident,
            "`KatRep` can only be derived for structs",
        )),
    }
}
