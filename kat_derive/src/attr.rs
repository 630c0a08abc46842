use syn::{Attribute, Error, Lit, Meta, NestedMeta, Result};

#[derive(Default)]
pub struct Container {
    pub name:   Option<String>,
    pub sealed: bool,
}

#[derive(Default)]
pub struct Field {
    pub rename:  Option<String>,
    pub aliases: Vec<String>,
    pub skip:    bool,
}

/// Collects the items of every `#[kat(...)]` attribute.
fn kat_items(attrs: &[Attribute]) -> Result<Vec<NestedMeta>> {
    let mut items = Vec::new();
    for attr in attrs.iter().filter(|a| a.path.is_ident("kat")) {
        match attr.parse_meta()? {
            Meta::List(list) => items.extend(list.nested),
            other => return Err(Error::new_spanned(other, "expected `#[kat(...)]`")),
        }
    }
    Ok(items)
}

fn string(lit: &Lit) -> Result<String> {
    match lit {
        Lit::Str(s) if !s.value().is_empty() => Ok(s.value()),
        Lit::Str(s) => Err(Error::new_spanned(s, "names must not be empty")),
        other => Err(Error::new_spanned(other, "expected a string literal")),
    }
}

impl Container {
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Container::default();
        for item in kat_items(attrs)? {
            match &item {
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("name") => {
                    out.name = Some(string(&nv.lit)?)
                }
                NestedMeta::Meta(Meta::Path(p)) if p.is_ident("sealed") => out.sealed = true,
                _ => return Err(Error::new_spanned(item, "unknown `kat` container attribute")),
            }
        }
        Ok(out)
    }
}

impl Field {
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Field::default();
        for item in kat_items(attrs)? {
            match &item {
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("rename") => {
                    out.rename = Some(string(&nv.lit)?)
                }
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("alias") => {
                    out.aliases.push(string(&nv.lit)?)
                }
                NestedMeta::Meta(Meta::Path(p)) if p.is_ident("skip") => out.skip = true,
                _ => return Err(Error::new_spanned(item, "unknown `kat` field attribute")),
            }
        }
        Ok(out)
    }
}
