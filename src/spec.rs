//! # Entity specs
//!
//! A [`Spec`] describes how an entity type appears in Kat notation: the entity name,
//! the ordered fields with their aliases and tags, and whether unknown fields are
//! rejected ("sealed") or skipped.
//!
//! Specs are declared through the [`Embed`] trait, usually generated by
//! `#[derive(KatRep)]`, and built once per type by the [`Registry`](crate::Registry).
//!
//! # Implementing `Embed` by hand
//!
//! ```
//! use kat::prelude::*;
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct User {
//!     id:      i32,
//!     name:    Option<String>,
//!     blocked: bool,
//! }
//!
//! impl Embed for User {
//!     fn expose(spec: &mut SpecBuilder<Self>) {
//!         spec.name("User")
//!             .field(&["id"], |u| &u.id, |u| &mut u.id)
//!             .field(&["name"], |u| &u.name, |u| &mut u.name)
//!             .field(&["blocked", "disabled"], |u| &u.blocked, |u| &mut u.blocked);
//!     }
//! }
//!
//! let spec = Registry::global().resolve::<User>().unwrap();
//!
//! assert_eq!(spec.name(), "User");
//! assert_eq!(spec.index_of("disabled"), Some(2));
//! assert_eq!(spec.field("disabled").unwrap().name(), "blocked");
//! ```

use crate::{
    decode::Binder,
    encode::Flow,
    errors::Error,
    kat::Kat,
    parser::Node,
    registry::Registry,
    rep::KatRep,
    tag::Tag,
    vecmap::VecMap,
};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::{borrow::Cow, fmt};
use tracing::trace;

/// A type that appears in Kat notation as a named entity.
pub trait Embed: Default + 'static {
    /// Declares the entity name, sealing and fields of this type.
    fn expose(spec: &mut SpecBuilder<Self>);
}

type WriteFn<T> = Box<dyn Fn(&T, &mut Flow<'_>, &str) -> Result<(), Error> + Send + Sync>;
type BindFn<T> = Box<dyn Fn(&mut T, Node, &Binder<'_>) -> Result<(), Error> + Send + Sync>;
type KatFn<T> = Box<dyn Fn(&T, &Registry) -> Result<Option<Kat>, Error> + Send + Sync>;

/// One exposed field of an entity.
pub struct FieldSpec<T> {
    aliases:  SmallVec<[Cow<'static, str>; 2]>,
    tag:      Tag,
    nullable: bool,
    write:    WriteFn<T>,
    bind:     BindFn<T>,
    to_kat:   KatFn<T>,
}

impl<T> FieldSpec<T> {
    /// The primary name, used when writing.
    pub fn name(&self) -> &str { &self.aliases[0] }

    /// Every accepted name, the primary one first.
    pub fn aliases(&self) -> impl Iterator<Item = &str> { self.aliases.iter().map(|a| &**a) }

    pub fn tag(&self) -> &Tag { &self.tag }

    pub fn is_nullable(&self) -> bool { self.nullable }
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("aliases", &self.aliases)
            .field("tag", &self.tag)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Collects the declaration of an [`Embed`] type.
pub struct SpecBuilder<T> {
    name:   Cow<'static, str>,
    sealed: bool,
    fields: Vec<FieldSpec<T>>,
}

impl<T> fmt::Debug for SpecBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SpecBuilder")
            .field("name", &self.name)
            .field("sealed", &self.sealed)
            .field("fields", &self.fields)
            .finish()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<T: Embed> SpecBuilder<T> {
    pub(crate) fn new() -> Self {
        SpecBuilder {
            name:   Cow::Borrowed(short_type_name::<T>()),
            sealed: false,
            fields: Vec::new(),
        }
    }

    /// Sets the entity name. Defaults to the name of the type.
    pub fn name<S: Into<Cow<'static, str>>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets whether unknown fields are rejected instead of skipped.
    pub fn sealed(&mut self, sealed: bool) -> &mut Self {
        self.sealed = sealed;
        self
    }

    /// Declares a field.
    ///
    /// # Arguments
    ///
    /// * `names: &[&'static str]` - The primary name followed by any aliases.
    /// * `get: fn(&T) -> &F` - Reads the field.
    /// * `get_mut: fn(&mut T) -> &mut F` - Assigns the field.
    pub fn field<F: KatRep + 'static>(
        &mut self,
        names: &[&'static str],
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let write: WriteFn<T> = Box::new(move |this: &T, flow: &mut Flow<'_>, name: &str| {
            let value = get(this);
            if value.is_null() {
                Ok(())
            } else {
                value.write(flow, Some(name))
            }
        });
        let bind: BindFn<T> = Box::new(move |this: &mut T, node: Node, binder: &Binder<'_>| {
            *get_mut(this) = binder.bind(node)?;
            Ok(())
        });
        let to_kat: KatFn<T> = Box::new(move |this: &T, registry: &Registry| {
            let value = get(this);
            if value.is_null() {
                Ok(None)
            } else {
                value.to_kat(registry).map(Some)
            }
        });
        self.fields.push(FieldSpec {
            aliases: names.iter().map(|n| Cow::Borrowed(*n)).collect(),
            tag: F::tag(),
            nullable: F::NULLABLE,
            write,
            bind,
            to_kat,
        });
        self
    }

    /// Validates the declaration and builds the [`Spec`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spec`] for an empty entity name, an entity named `A` or `M`,
    /// a field without names, an empty name, or a name shared by two fields.
    pub fn build(self) -> Result<Spec<T>, Error> {
        let SpecBuilder {
            name,
            sealed,
            fields,
        } = self;

        match &*name {
            "" => return Err(Error::spec(name.clone(), "entity name is empty")),
            "A" | "M" => {
                return Err(Error::spec(
                    name.clone(),
                    "entity name collides with a block tag",
                ))
            }
            _ => {}
        }

        let mut index = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            if field.aliases.is_empty() {
                return Err(Error::spec(name, format!("field {} has no name", i)));
            }
            for alias in field.aliases.iter() {
                if alias.is_empty() {
                    return Err(Error::spec(name, format!("field {} has an empty name", i)));
                }
                if index.insert(alias.clone(), i).is_some() {
                    return Err(Error::spec(
                        name,
                        format!("`{}` names more than one field", alias),
                    ));
                }
            }
        }

        Ok(Spec {
            name,
            sealed,
            fields,
            index,
        })
    }
}

/// The schema of an [`Embed`] type.
pub struct Spec<T> {
    name:   Cow<'static, str>,
    sealed: bool,
    fields: Vec<FieldSpec<T>>,
    index:  HashMap<Cow<'static, str>, usize>,
}

impl<T> fmt::Debug for Spec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Spec")
            .field("name", &self.name)
            .field("sealed", &self.sealed)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T: Embed> Spec<T> {
    /// The entity name.
    pub fn name(&self) -> &str { &self.name }

    pub fn is_sealed(&self) -> bool { self.sealed }

    /// The fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec<T>] { &self.fields }

    /// Looks up a field by any of its names.
    pub fn field(&self, alias: &str) -> Option<&FieldSpec<T>> {
        self.index_of(alias).map(|i| &self.fields[i])
    }

    /// The position of the field called `alias`.
    pub fn index_of(&self, alias: &str) -> Option<usize> { self.index.get(alias).copied() }

    /// Builds a `T` from entity members, starting from `T::default()`.
    ///
    /// Absent fields keep their default. Repeated fields are assigned in order, so the
    /// last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for a member a sealed spec does not declare, and
    /// [`Error::Coercion`] for a member that does not fit its field. A sealed spec also
    /// rejects scalars with unknown tags.
    pub fn bind(&self, members: Vec<(String, Node)>, binder: &Binder<'_>) -> Result<T, Error> {
        let mut this = T::default();
        for (key, node) in members {
            let field = match self.index_of(&key) {
                Some(i) => &self.fields[i],
                None if self.sealed => {
                    return Err(Error::UnknownField {
                        entity: self.name.to_string(),
                        field:  key,
                    })
                }
                None => {
                    trace!(entity = %self.name, field = %key, "skipping unknown field");
                    continue;
                }
            };
            if self.sealed {
                if let Node::Scalar {
                    tag: Tag::Opaque(tag),
                    text,
                } = &node
                {
                    return Err(Error::coercion(field.tag(), format!("{}({})", tag, text))
                        .in_field(field.name()));
                }
            }
            (field.bind)(&mut this, node, binder).map_err(|e| e.in_field(field.name()))?;
        }
        Ok(this)
    }

    /// Writes the fields of `value` in declaration order under their primary names.
    /// Null fields are omitted.
    pub fn write(&self, value: &T, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        flow.open(&self.name, name);
        for field in &self.fields {
            (field.write)(value, flow, field.name())?;
        }
        flow.close();
        Ok(())
    }

    /// Calls `sink` with the primary name and value of each non-null field, in
    /// declaration order.
    pub fn flat<F: FnMut(&str, Kat)>(
        &self,
        value: &T,
        registry: &Registry,
        mut sink: F,
    ) -> Result<(), Error> {
        for field in &self.fields {
            if let Some(kat) = (field.to_kat)(value, registry)? {
                sink(field.name(), kat);
            }
        }
        Ok(())
    }

    /// Converts `value` into a [`Kat::Entity`].
    pub fn to_kat(&self, value: &T, registry: &Registry) -> Result<Kat, Error> {
        let mut fields = VecMap::with_capacity(self.fields.len());
        self.flat(value, registry, |name, kat| {
            fields.insert(name.to_string(), kat);
        })?;
        Ok(Kat::Entity {
            name: self.name.to_string(),
            fields,
        })
    }
}

/// Writes an [`Embed`] value through its spec in the flow's registry.
pub fn write_entity<T: Embed>(
    value: &T,
    flow: &mut Flow<'_>,
    name: Option<&str>,
) -> Result<(), Error> {
    let spec = flow.registry().resolve::<T>()?;
    spec.write(value, flow, name)
}

/// Converts an [`Embed`] value into a [`Kat::Entity`] through its spec.
pub fn entity_to_kat<T: Embed>(value: &T, registry: &Registry) -> Result<Kat, Error> {
    registry.resolve::<T>()?.to_kat(value, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::ErrorKind, parser::parse};

    #[derive(Default, Debug, PartialEq)]
    struct Flag {
        flag:  bool,
        count: i32,
    }

    impl Embed for Flag {
        fn expose(spec: &mut SpecBuilder<Self>) {
            spec.field(&["flag", "other"], |f| &f.flag, |f| &mut f.flag)
                .field(&["count"], |f| &f.count, |f| &mut f.count);
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Strict {
        id: i32,
    }

    impl Embed for Strict {
        fn expose(spec: &mut SpecBuilder<Self>) {
            spec.name("Strict")
                .sealed(true)
                .field(&["id"], |s| &s.id, |s| &mut s.id);
        }
    }

    fn members(text: &str) -> Vec<(String, Node)> {
        match parse(text).unwrap() {
            Node::Entity { fields, .. } => fields,
            other => panic!("expected an entity, got {:?}", other),
        }
    }

    fn bind<T: Embed>(text: &str) -> Result<T, Error> {
        let registry = Registry::new();
        let spec = registry.resolve::<T>()?;
        spec.bind(members(text), &Binder::new(&registry, Default::default()))
    }

    #[test]
    fn default_name_is_the_type_name() {
        let spec = SpecBuilder::<Flag>::new().build().unwrap();
        assert_eq!(spec.name(), "Flag");
    }

    #[test]
    fn aliases_resolve_to_one_field() {
        let a: Flag = bind("Flag{b:flag(1)}").unwrap();
        let b: Flag = bind("Flag{b:other(1)}").unwrap();
        assert_eq!(a, b);
        assert!(a.flag);
    }

    #[test]
    fn later_members_win() {
        let f: Flag = bind("Flag{i:count(1)i:count(2)}").unwrap();
        assert_eq!(f.count, 2);
    }

    #[test]
    fn unsealed_specs_skip_unknown_fields() {
        let f: Flag = bind("Flag{i:count(3)s:extra(x)A:more{i(1)}}").unwrap();
        assert_eq!(f.count, 3);
    }

    #[test]
    fn sealed_specs_reject_unknown_fields() {
        match bind::<Strict>("Strict{i:id(1)s:extra(x)}").unwrap_err() {
            Error::UnknownField { entity, field } => {
                assert_eq!(entity, "Strict");
                assert_eq!(field, "extra");
            }
            other => panic!("expected an unknown field error, got {:?}", other),
        }
    }

    #[test]
    fn sealed_specs_reject_opaque_tags() {
        match bind::<Strict>("Strict{zz:id(1)}").unwrap_err() {
            Error::Coercion {
                field,
                tag,
                literal,
            } => {
                assert_eq!(field, "id");
                assert_eq!(tag, "i");
                assert_eq!(literal, "zz(1)");
            }
            other => panic!("expected a coercion error, got {:?}", other),
        }
        // unsealed specs read the literal as if it were well tagged
        let f: Flag = bind("Flag{zz:count(5)}").unwrap();
        assert_eq!(f.count, 5);
    }

    #[test]
    fn coercion_errors_name_the_field() {
        match bind::<Flag>("Flag{i:count(abc)}").unwrap_err() {
            Error::Coercion { field, .. } => assert_eq!(field, "count"),
            other => panic!("expected a coercion error, got {:?}", other),
        }
    }

    #[test]
    fn writes_primary_names_in_order() {
        let registry = Registry::new();
        let spec = registry.resolve::<Flag>().unwrap();
        let mut flow = Flow::with_registry(&registry);
        spec.write(
            &Flag {
                flag:  true,
                count: 2,
            },
            &mut flow,
            None,
        )
        .unwrap();
        assert_eq!(flow.finalize(), "Flag{b:flag(1)i:count(2)}");
    }

    #[test]
    fn invalid_declarations() {
        fn check(spec: SpecBuilder<Flag>) {
            assert_eq!(spec.build().unwrap_err().kind(), ErrorKind::Spec);
        }

        let mut b = SpecBuilder::<Flag>::new();
        b.name("");
        check(b);

        let mut b = SpecBuilder::<Flag>::new();
        b.name("A");
        check(b);

        let mut b = SpecBuilder::<Flag>::new();
        b.field(&[], |f| &f.flag, |f| &mut f.flag);
        check(b);

        let mut b = SpecBuilder::<Flag>::new();
        b.field(&[""], |f| &f.flag, |f| &mut f.flag);
        check(b);

        let mut b = SpecBuilder::<Flag>::new();
        b.field(&["flag", "x"], |f| &f.flag, |f| &mut f.flag)
            .field(&["count", "x"], |f| &f.count, |f| &mut f.count);
        check(b);
    }
}
