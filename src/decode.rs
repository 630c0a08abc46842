//! # Binding parsed trees to typed values
//!
//! A [`Binder`] carries what binding needs besides the tree itself: the [`Registry`]
//! entity specs are resolved in, and the [`Depth`] policy for nested composites.
//!
//! The depth policy only matters to [`Deferred`] fields. Under [`Depth::Shallow`] a
//! deferred field keeps its composite node unbound until it is
//! [resolved](Deferred::resolve); under the other policies it is bound on the spot.
//! Alias resolution, sealing and coercion are the same under every policy.

use crate::{
    encode::Flow,
    errors::Error,
    kat::Kat,
    parser::Node,
    registry::Registry,
    rep::KatRep,
    spec::Embed,
    tag::Tag,
};
use tracing::trace;

/// How eagerly nested composites are bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Bind the whole tree. The default for [`read`](crate::Supplier::read).
    Read,
    /// Bind the top level, parking nested composites held by [`Deferred`] fields.
    Shallow,
    /// Bind the whole tree, including every [`Deferred`] field.
    Full,
}

impl Default for Depth {
    fn default() -> Self { Depth::Read }
}

/// Binds parsed nodes to typed values.
#[derive(Clone, Copy, Debug)]
pub struct Binder<'r> {
    registry: &'r Registry,
    depth:    Depth,
}

impl Default for Binder<'static> {
    fn default() -> Self { Binder::new(Registry::global(), Depth::Read) }
}

impl<'r> Binder<'r> {
    pub fn new(registry: &'r Registry, depth: Depth) -> Self { Binder { registry, depth } }

    pub fn registry(&self) -> &'r Registry { self.registry }

    pub fn depth(&self) -> Depth { self.depth }

    /// Binds `node` to a `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::{parser::parse, Binder};
    ///
    /// let ids: Vec<i32> = Binder::default()
    ///     .bind(parse("A{i(1)i(2)i(3)}").unwrap())
    ///     .unwrap();
    ///
    /// assert_eq!(ids, vec![1, 2, 3]);
    /// ```
    pub fn bind<T: KatRep>(&self, node: Node) -> Result<T, Error> { T::bind(node, self) }

    /// Binds an entity or map node through the spec of `T`.
    ///
    /// The entity name written in the input is not checked against the spec's name.
    pub fn entity<T: Embed>(&self, node: Node) -> Result<T, Error> {
        let spec = self.registry.resolve::<T>()?;
        match node {
            Node::Entity { fields, .. } | Node::Map(fields) => spec.bind(fields, self),
            other => Err(Error::coercion(
                Tag::Entity(spec.name().to_string().into()),
                other.to_string(),
            )),
        }
    }
}

/// A field whose binding may be put off until it is needed.
///
/// # Example
///
/// ```
/// use kat::prelude::*;
///
/// #[derive(KatRep, Default, Debug)]
/// struct Page {
///     #[kat(rename = "n")]
///     number: i32,
///     rows: Deferred<Vec<i32>>,
/// }
///
/// let page: Page = kat::down("Page{i:n(1)A:rows{i(1)i(2)}}").unwrap();
/// assert!(page.rows.is_pending());
///
/// let rows = page.rows.resolve().unwrap();
/// assert_eq!(rows, vec![1, 2]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Deferred<T> {
    // the default value while `node` is parked
    value: T,
    node:  Option<Node>,
}

impl<T: KatRep> Deferred<T> {
    /// Wraps a bound value.
    pub fn new(value: T) -> Self { Deferred { value, node: None } }

    /// Indicates whether the value is still an unbound node.
    pub fn is_pending(&self) -> bool { self.node.is_some() }

    /// Returns the bound value, or `None` while pending.
    pub fn get(&self) -> Option<&T> {
        match self.node {
            Some(_) => None,
            None => Some(&self.value),
        }
    }

    /// Returns the parked node, or `None` once bound.
    pub fn node(&self) -> Option<&Node> { self.node.as_ref() }

    /// Consumes this field, binding it fully against the global registry if needed.
    pub fn resolve(self) -> Result<T, Error> {
        self.resolve_in(&Binder::new(Registry::global(), Depth::Full))
    }

    /// Consumes this field, binding it with `binder` if needed.
    pub fn resolve_in(self, binder: &Binder<'_>) -> Result<T, Error> {
        match self.node {
            Some(node) => binder.bind(node),
            None => Ok(self.value),
        }
    }

    /// Binds this field in place if needed, returning a reference to the value.
    ///
    /// On error the field stays pending.
    pub fn force(&mut self, binder: &Binder<'_>) -> Result<&T, Error> {
        if let Some(node) = &self.node {
            self.value = binder.bind(node.clone())?;
            self.node = None;
        }
        Ok(&self.value)
    }
}

impl<T: Default> Default for Deferred<T> {
    fn default() -> Self {
        Deferred {
            value: T::default(),
            node:  None,
        }
    }
}

impl<T: KatRep> From<T> for Deferred<T> {
    fn from(value: T) -> Self { Deferred::new(value) }
}

impl<T: KatRep + Default> KatRep for Deferred<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn tag() -> Tag { T::tag() }

    fn is_null(&self) -> bool {
        self.node.is_none() && self.value.is_null()
    }

    /// A pending field writes its node back out unchanged.
    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        match &self.node {
            Some(node) => node.write(flow, name),
            None => self.value.write(flow, name),
        }
    }

    fn bind(node: Node, binder: &Binder<'_>) -> Result<Self, Error> {
        if binder.depth() == Depth::Shallow && node.is_composite() {
            trace!(tag = %node.tag(), "deferring nested composite");
            Ok(Deferred {
                value: T::default(),
                node:  Some(node),
            })
        } else {
            binder.bind(node).map(Deferred::new)
        }
    }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> {
        match &self.node {
            Some(node) => Binder::new(registry, Depth::Full).bind(node.clone()),
            None => self.value.to_kat(registry),
        }
    }
}
