//! The entry points for reading and writing Kat notation.
//!
//! A [`Supplier`] ties a [`Registry`] to decoding [`Options`]. Most programs use the
//! global one through the crate-level shorthands ([`read`](crate::read),
//! [`write`](crate::write), ...), which are equivalent to [`Supplier::ins`].
//!
//! # Example
//!
//! ```
//! use kat::prelude::*;
//!
//! #[derive(KatRep, Default, Debug, PartialEq)]
//! struct User {
//!     id:   i32,
//!     name: Option<String>,
//!     #[kat(alias = "disabled")]
//!     blocked: bool,
//! }
//!
//! let supplier = Supplier::ins();
//!
//! let user: User = supplier
//!     .read("User{i:id(1)s:name(kraity)b:disabled(1)}")
//!     .unwrap();
//!
//! assert_eq!(
//!     supplier.write(&user).unwrap(),
//!     "User{i:id(1)s:name(kraity)b:blocked(1)}"
//! );
//! ```

use crate::{
    decode::{Binder, Depth},
    encode::Flow,
    errors::Error,
    kat::Kat,
    parser::{Parser, MAX_NESTING},
    registry::Registry,
    rep::KatRep,
    spec::{Embed, Spec},
};
use bytes::Bytes;
use std::sync::Arc;

/// Decoding configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// The depth policy used by [`Supplier::decode`].
    pub depth:       Depth,
    /// How deeply blocks may nest before parsing fails.
    pub max_nesting: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            depth:       Depth::Read,
            max_nesting: MAX_NESTING,
        }
    }
}

/// Reads and writes Kat notation against a [`Registry`].
#[derive(Clone, Copy, Debug)]
pub struct Supplier<'r> {
    registry: &'r Registry,
    options:  Options,
}

impl Supplier<'static> {
    /// The supplier over the global registry, with default options.
    pub fn ins() -> Self { Supplier::new(Registry::global()) }
}

impl<'r> Supplier<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Supplier {
            registry,
            options: Options::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &'r Registry { self.registry }

    pub fn options(&self) -> Options { self.options }

    /// Binds loosely typed data to `T`.
    ///
    /// Anything convertible into [`Kat`] is accepted; conversions between scalars are
    /// lenient, so numbers bind to strings and numeric strings bind to numbers. Null
    /// input gives `None`, and null members leave their field at its default.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    ///
    /// let data: Kat = vec![("x", Kat::from("12")), ("y", Kat::from(3))]
    ///     .into_iter()
    ///     .collect();
    ///
    /// let map: VecMap<String, i64> = kat::cast(data).unwrap().unwrap();
    /// assert_eq!(map.get("x"), Some(&12));
    ///
    /// assert_eq!(kat::cast::<i32, _>(Kat::Null).unwrap(), None);
    /// ```
    pub fn cast<T: KatRep, D: Into<Kat>>(&self, data: D) -> Result<Option<T>, Error> {
        match data.into().into_node() {
            None => Ok(None),
            Some(node) => self.binder(self.options.depth).bind(node).map(Some),
        }
    }

    fn binder(&self, depth: Depth) -> Binder<'r> { Binder::new(self.registry, depth) }

    fn decode_with<T: KatRep, S: AsRef<[u8]>>(&self, src: S, depth: Depth) -> Result<T, Error> {
        let node = Parser::from_bytes(src.as_ref())?
            .with_max_nesting(self.options.max_nesting)
            .parse()?;
        self.binder(depth).bind(node)
    }

    /// Decodes `src` fully.
    pub fn read<T: KatRep, S: AsRef<[u8]>>(&self, src: S) -> Result<T, Error> {
        self.decode_with(src, Depth::Read)
    }

    /// Decodes `src`, leaving the nested composites of [`Deferred`](crate::Deferred)
    /// fields unbound.
    pub fn down<T: KatRep, S: AsRef<[u8]>>(&self, src: S) -> Result<T, Error> {
        self.decode_with(src, Depth::Shallow)
    }

    /// Decodes `src`, binding every nested composite including deferred ones.
    pub fn parse<T: KatRep, S: AsRef<[u8]>>(&self, src: S) -> Result<T, Error> {
        self.decode_with(src, Depth::Full)
    }

    /// Decodes `src` with the configured depth policy.
    pub fn decode<T: KatRep, S: AsRef<[u8]>>(&self, src: S) -> Result<T, Error> {
        self.decode_with(src, self.options.depth)
    }

    fn flow<T: KatRep>(&self, value: &T) -> Result<Flow<'r>, Error> {
        let mut flow = Flow::with_registry(self.registry);
        value.write(&mut flow, None)?;
        Ok(flow)
    }

    /// Encodes `value` as Kat text.
    pub fn write<T: KatRep>(&self, value: &T) -> Result<String, Error> {
        Ok(self.flow(value)?.finalize())
    }

    /// Encodes `value` as UTF-8 Kat bytes.
    pub fn write_bytes<T: KatRep>(&self, value: &T) -> Result<Bytes, Error> {
        Ok(self.flow(value)?.into_bytes())
    }

    /// Calls `sink` with the primary name and value of each non-null field of `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    ///
    /// #[derive(KatRep, Default)]
    /// struct Point {
    ///     x: i32,
    ///     y: Option<i32>,
    ///     z: i32,
    /// }
    ///
    /// let mut names = Vec::new();
    /// Supplier::ins()
    ///     .flat(&Point { x: 1, y: None, z: 3 }, |name, _| names.push(name.to_string()))
    ///     .unwrap();
    ///
    /// assert_eq!(names, vec!["x", "z"]);
    /// ```
    pub fn flat<T: Embed, F: FnMut(&str, Kat)>(&self, value: &T, sink: F) -> Result<(), Error> {
        self.spec::<T>()?.flat(value, self.registry, sink)
    }

    /// Resolves the spec of `T` in this supplier's registry.
    pub fn spec<T: Embed>(&self) -> Result<Arc<Spec<T>>, Error> { self.registry.resolve::<T>() }
}
