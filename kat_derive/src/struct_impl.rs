use crate::attr;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, DataStruct, DeriveInput, Error, Fields, Result};

pub fn kat_rep(input: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &input.ident;
    let container = attr::Container::from_attrs(&input.attrs)?;
    let entity = container
        .name
        .unwrap_or_else(|| name.unraw().to_string());
    let sealed = container.sealed;

    let fields: Vec<&syn::Field> = match &data.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(Error::new_spanned(
                name,
                "`KatRep` needs named fields; tuple structs have no field names to write",
            ))
        }
    };

    let mut exposed = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = attr::Field::from_attrs(&field.attrs)?;
        let ident = match &field.ident {
            Some(ident) if !attrs.skip => ident,
            _ => continue,
        };
        let ty = &field.ty;
        let primary = attrs.rename.unwrap_or_else(|| ident.unraw().to_string());
        let aliases = attrs.aliases;

        exposed.push(quote! {
            spec.field::<#ty>(
                &[#primary #(, #aliases)*],
                |this| &this.#ident,
                |this| &mut this.#ident,
            );
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::kat::Embed for #name #ty_generics #where_clause {
            fn expose(spec: &mut ::kat::SpecBuilder<Self>) {
                spec.name(#entity).sealed(#sealed);
                #(#exposed)*
            }
        }

        impl #impl_generics ::kat::KatRep for #name #ty_generics #where_clause {
            fn tag() -> ::kat::Tag { ::kat::Tag::entity(#entity) }

            fn write(
                &self,
                flow: &mut ::kat::Flow<'_>,
                name: ::std::option::Option<&str>,
            ) -> ::std::result::Result<(), ::kat::Error> {
                ::kat::spec::write_entity(self, flow, name)
            }

            fn bind(
                node: ::kat::Node,
                binder: &::kat::Binder<'_>,
            ) -> ::std::result::Result<Self, ::kat::Error> {
                binder.entity(node)
            }

            fn to_kat(
                &self,
                registry: &::kat::Registry,
            ) -> ::std::result::Result<::kat::Kat, ::kat::Error> {
                ::kat::spec::entity_to_kat(self, registry)
            }
        }
    })
}
