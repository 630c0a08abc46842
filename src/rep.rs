//! The [`KatRep`] trait and its implementations for standard types.
//!
//! A type is representable in Kat notation when it knows its [`Tag`], how to write
//! itself into a [`Flow`], how to bind itself from a parsed [`Node`], and how to turn
//! itself into a dynamic [`Kat`] value.
//!
//! Entities get their implementation from `#[derive(KatRep)]`; see
//! [`Embed`](crate::Embed) for writing one by hand.

use crate::{
    decode::Binder,
    encode::Flow,
    errors::Error,
    kat::Kat,
    parser::Node,
    registry::Registry,
    tag::Tag,
    vecmap::VecMap,
};
use num_traits::{NumCast, ToPrimitive};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt::Display,
    hash::{BuildHasher, Hash},
    str::FromStr,
};

/// A value representable in Kat notation.
pub trait KatRep: Sized {
    /// Whether values of this type may be null. Null fields are omitted when writing.
    const NULLABLE: bool = false;

    /// The tag values of this type are declared with.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    ///
    /// assert_eq!(i32::tag(), Tag::Int);
    /// assert_eq!(u64::tag(), Tag::Long);
    /// assert_eq!(<Vec<String>>::tag(), Tag::Array);
    /// ```
    fn tag() -> Tag;

    /// Whether this value is null and should be omitted.
    fn is_null(&self) -> bool { false }

    /// Writes this value into `flow`, as a member called `name` when one is given.
    ///
    /// # Arguments
    ///
    /// * `flow: &mut Flow` - The output.
    /// * `name: Option<&str>` - The member name; `None` for roots and array elements.
    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error>;

    /// Binds a value of this type from a parsed node.
    ///
    /// # Arguments
    ///
    /// * `node: Node` - The parsed node, consumed.
    /// * `binder: &Binder` - Supplies the registry and the depth policy for nested values.
    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error>;

    /// Converts this value into a dynamic [`Kat`] value.
    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error>;
}

fn scalar_parts(node: Node, tag: &Tag) -> Result<(Tag, String), Error> {
    match node {
        Node::Scalar { tag, text } => Ok((tag, text)),
        other => Err(Error::coercion(tag, other.to_string())),
    }
}

fn is_numeric(tag: &Tag) -> bool {
    match tag {
        Tag::Int | Tag::Long | Tag::Float | Tag::Double => true,
        _ => false,
    }
}

/// Parses an integer literal. Integral floats written under `f` or `d` are accepted.
pub(crate) fn parse_int<N: FromStr + NumCast>(node: Node, tag: &Tag) -> Result<N, Error> {
    let (from, text) = scalar_parts(node, tag)?;
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<N>() {
        return Ok(n);
    }
    if from == Tag::Float || from == Tag::Double {
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.fract() == 0.0 {
                if let Some(n) = <N as NumCast>::from(f) {
                    return Ok(n);
                }
            }
        }
    }
    Err(Error::coercion(tag, text))
}

pub(crate) fn parse_float<N: FromStr>(node: Node, tag: &Tag) -> Result<N, Error> {
    let (_, text) = scalar_parts(node, tag)?;
    let parsed = text.trim().parse::<N>();
    match parsed {
        Ok(f) => Ok(f),
        Err(_) => Err(Error::coercion(tag, text)),
    }
}

/// Parses a boolean literal: `1`, `0`, `true` or `false`. Numeric scalars are
/// true when nonzero.
pub(crate) fn parse_bool(node: Node) -> Result<bool, Error> {
    let (from, text) = scalar_parts(node, &Tag::Bool)?;
    match text.trim() {
        "1" | "true" => return Ok(true),
        "0" | "false" => return Ok(false),
        _ => {}
    }
    if is_numeric(&from) {
        if let Ok(f) = text.trim().parse::<f64>() {
            return Ok(f != 0.0);
        }
    }
    Err(Error::coercion(Tag::Bool, text))
}

fn int_to_kat<N: ToPrimitive + Display>(n: N, tag: &Tag) -> Result<Kat, Error> {
    let kat = match tag {
        Tag::Int => n.to_i32().map(Kat::Int),
        _ => n.to_i64().map(Kat::Long),
    };
    kat.ok_or_else(|| Error::coercion(tag, n.to_string()))
}

macro_rules! int_rep {
    ($tag:expr, $($t:ty),*) => {
        $(
            impl KatRep for $t {
                fn tag() -> Tag { $tag }

                fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
                    flow.put_number($tag.as_str(), name, self);
                    Ok(())
                }

                fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> {
                    parse_int(node, &$tag)
                }

                fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { int_to_kat(*self, &$tag) }
            }
        )*
    };
}

int_rep!(Tag::Int, i8, i16, i32, u8, u16);
int_rep!(Tag::Long, i64, u32, u64, isize, usize);

impl KatRep for f32 {
    fn tag() -> Tag { Tag::Float }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        flow.put_f32(name, *self);
        Ok(())
    }

    fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> { parse_float(node, &Tag::Float) }

    fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { Ok(Kat::Float(*self)) }
}

impl KatRep for f64 {
    fn tag() -> Tag { Tag::Double }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        flow.put_f64(name, *self);
        Ok(())
    }

    fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> { parse_float(node, &Tag::Double) }

    fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { Ok(Kat::Double(*self)) }
}

impl KatRep for bool {
    fn tag() -> Tag { Tag::Bool }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        flow.put_bool(name, *self);
        Ok(())
    }

    fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> { parse_bool(node) }

    fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { Ok(Kat::Bool(*self)) }
}

impl KatRep for String {
    fn tag() -> Tag { Tag::Str }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        flow.put_str(name, self);
        Ok(())
    }

    fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> {
        scalar_parts(node, &Tag::Str).map(|(_, text)| text)
    }

    fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { Ok(Kat::Str(self.clone())) }
}

impl KatRep for char {
    fn tag() -> Tag { Tag::Str }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        flow.put_str(name, self.encode_utf8(&mut [0; 4]));
        Ok(())
    }

    fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> {
        let (_, text) = scalar_parts(node, &Tag::Str)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::coercion(Tag::Str, text)),
        }
    }

    fn to_kat(&self, _: &Registry) -> Result<Kat, Error> { Ok(Kat::Str(self.to_string())) }
}

impl<T: KatRep> KatRep for Option<T> {
    const NULLABLE: bool = true;

    fn tag() -> Tag { T::tag() }

    fn is_null(&self) -> bool {
        match self {
            Some(t) => t.is_null(),
            None => true,
        }
    }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        match self {
            Some(t) => t.write(flow, name),
            None => Ok(()),
        }
    }

    /// An empty literal binds to `None`, unless it is tagged as a string.
    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> {
        match &node {
            Node::Scalar { tag, text } if text.is_empty() && *tag != Tag::Str => Ok(None),
            _ => T::bind(node, binder).map(Some),
        }
    }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> {
        match self {
            Some(t) => t.to_kat(registry),
            None => Ok(Kat::Null),
        }
    }
}

impl<T: KatRep> KatRep for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn tag() -> Tag { T::tag() }

    fn is_null(&self) -> bool { (**self).is_null() }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        (**self).write(flow, name)
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> {
        T::bind(node, binder).map(Box::new)
    }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { (**self).to_kat(registry) }
}

// Sequences write as `A{...}` and bind element by element.

fn write_seq<'a, T, I>(flow: &mut Flow<'_>, name: Option<&str>, items: I) -> Result<(), Error>
where
    T: KatRep + 'a,
    I: Iterator<Item = &'a T>,
{
    flow.open(Tag::Array.as_str(), name);
    for item in items.filter(|item| !item.is_null()) {
        item.write(flow, None)?;
    }
    flow.close();
    Ok(())
}

fn bind_seq<T, C>(node: Node, binder: &Binder<'_>) -> Result<C, Error>
where
    T: KatRep,
    C: std::iter::FromIterator<T>,
{
    match node {
        Node::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| binder.bind::<T>(item).map_err(|e| e.at_index(i)))
            .collect(),
        other => Err(Error::coercion(Tag::Array, other.to_string())),
    }
}

fn seq_to_kat<'a, T, I>(registry: &Registry, items: I) -> Result<Kat, Error>
where
    T: KatRep + 'a,
    I: Iterator<Item = &'a T>,
{
    items
        .filter(|item| !item.is_null())
        .map(|item| item.to_kat(registry))
        .collect::<Result<Vec<_>, Error>>()
        .map(Kat::Array)
}

impl<T: KatRep> KatRep for Vec<T> {
    fn tag() -> Tag { Tag::Array }

    /// Null elements are skipped.
    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_seq(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_seq(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { seq_to_kat(registry, self.iter()) }
}

impl<T: KatRep + Eq + Hash, S: BuildHasher + Default> KatRep for HashSet<T, S> {
    fn tag() -> Tag { Tag::Array }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_seq(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_seq(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { seq_to_kat(registry, self.iter()) }
}

impl<T: KatRep + Eq + Hash, S: BuildHasher + Default> KatRep for hashbrown::HashSet<T, S> {
    fn tag() -> Tag { Tag::Array }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_seq(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_seq(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { seq_to_kat(registry, self.iter()) }
}

impl<T: KatRep + Ord> KatRep for BTreeSet<T> {
    fn tag() -> Tag { Tag::Array }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_seq(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_seq(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { seq_to_kat(registry, self.iter()) }
}

// Maps bind from both `M{...}` and entity blocks, so that a record written by one
// program can be read as a plain map by another.

fn write_map<'a, T, I>(flow: &mut Flow<'_>, name: Option<&str>, pairs: I) -> Result<(), Error>
where
    T: KatRep + 'a,
    I: Iterator<Item = (&'a String, &'a T)>,
{
    flow.open(Tag::Map.as_str(), name);
    for (key, value) in pairs.filter(|(_, v)| !v.is_null()) {
        value.write(flow, Some(key))?;
    }
    flow.close();
    Ok(())
}

fn bind_map<T, C>(node: Node, binder: &Binder<'_>) -> Result<C, Error>
where
    T: KatRep,
    C: std::iter::FromIterator<(String, T)>,
{
    let pairs = match node {
        Node::Map(pairs) | Node::Entity { fields: pairs, .. } => pairs,
        other => return Err(Error::coercion(Tag::Map, other.to_string())),
    };
    pairs
        .into_iter()
        .map(|(key, value)| match binder.bind::<T>(value) {
            Ok(v) => Ok((key, v)),
            Err(e) => Err(e.in_field(&key)),
        })
        .collect()
}

fn map_to_kat<'a, T, I>(registry: &Registry, pairs: I) -> Result<Kat, Error>
where
    T: KatRep + 'a,
    I: Iterator<Item = (&'a String, &'a T)>,
{
    pairs
        .filter(|(_, v)| !v.is_null())
        .map(|(key, value)| value.to_kat(registry).map(|kat| (key.clone(), kat)))
        .collect::<Result<VecMap<_, _>, Error>>()
        .map(Kat::Map)
}

impl<T: KatRep, S: BuildHasher + Default> KatRep for HashMap<String, T, S> {
    fn tag() -> Tag { Tag::Map }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_map(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_map(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { map_to_kat(registry, self.iter()) }
}

impl<T: KatRep, S: BuildHasher + Default> KatRep for hashbrown::HashMap<String, T, S> {
    fn tag() -> Tag { Tag::Map }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_map(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_map(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { map_to_kat(registry, self.iter()) }
}

impl<T: KatRep> KatRep for BTreeMap<String, T> {
    fn tag() -> Tag { Tag::Map }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_map(flow, name, self.iter())
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_map(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> { map_to_kat(registry, self.iter()) }
}

impl<T: KatRep> KatRep for VecMap<String, T> {
    fn tag() -> Tag { Tag::Map }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        write_map(flow, name, self.iter().map(|(k, v)| (k, v)))
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> { bind_map(node, binder) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> {
        map_to_kat(registry, self.iter().map(|(k, v)| (k, v)))
    }
}
