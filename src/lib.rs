//! # Kat
//!
//! Kat notation is a compact, self-describing text format. Every value carries a
//! one-letter type tag, so a document can be read without knowing its schema, while
//! typed programs bind it to their own structs through a cached per-type [`Spec`].
//!
//! # Usage
//!
//! The trait [`KatRep`] is used to specify how data is read from and written to Kat
//! notation. For structs it can be derived, which also declares the struct's [`Spec`]:
//! its entity name, its fields, their aliases, and whether unknown fields are rejected.
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
//! let user: User = kat::read("User{i:id(1)s:name(kraity)b:disabled(1)}").unwrap();
//!
//! assert_eq!(
//!     user,
//!     User {
//!         id:      1,
//!         name:    Some("kraity".to_string()),
//!         blocked: true,
//!     }
//! );
//!
//! // fields are always written under their primary name
//! assert_eq!(
//!     kat::write(&user).unwrap(),
//!     "User{i:id(1)s:name(kraity)b:blocked(1)}"
//! );
//! ```
//!
//! Documents of unknown shape decode to the dynamic [`Kat`] value:
//!
//! ```
//! use kat::prelude::*;
//!
//! let value: Kat = kat::read("A{i(1)s(kraity)}").unwrap();
//!
//! assert_eq!(value, Kat::Array(vec![Kat::Int(1), Kat::Str("kraity".to_string())]));
//! ```
//!
//! # The notation
//!
//! ## Scalars
//!
//! A scalar is a tag followed by its literal in parentheses. Inside an entity or map
//! the tag is followed by `:` and the member name; inside an array the name is left
//! out.
//!
//! | Tag | Type           | Example           |
//! | --- | ---            | ---               |
//! | `i` | 32-bit integer | `i:id(1)`         |
//! | `l` | 64-bit integer | `l:stamp(1024)`   |
//! | `f` | 32-bit float   | `f:ratio(0.5)`    |
//! | `d` | 64-bit float   | `d:weight(6.5)`   |
//! | `s` | string         | `s:name(kraity)`  |
//! | `b` | boolean        | `b:blocked(1)`    |
//!
//! Floats are always written with a decimal point and booleans as `1` or `0`. Scalars
//! with any other tag are kept as opaque text.
//!
//! Within a literal, `^` escapes the next character, so `^(`, `^)` and `^^` stand for
//! `(`, `)` and `^`. Whitespace inside a literal is significant; outside, it is ignored.
//!
//! ## Blocks
//!
//! * Entities: `User{i:id(1)s:name(kraity)}`.
//! * Arrays: `A{i(1)i(2)i(3)}`, whose elements may be scalars or blocks.
//! * Maps: `M{i:id(1)s:name(kraity)}`, whose members look like entity fields.
//!
//! Blocks nest as members, e.g. `User{A:roles{s(admin)}M:meta{b:verified(1)}}`.
//!
//! # Decoding depth
//!
//! [`read`] and [`parse`] bind the whole document. [`down`] leaves the nested
//! composites of [`Deferred`] fields unbound until they are resolved.

#![warn(
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    missing_copy_implementations,
    missing_debug_implementations,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![allow(clippy::new_without_default)]

pub mod decode;
pub mod encode;
pub mod errors;
pub mod kat;
pub mod lexer;
pub mod parser;
pub mod prelude;
pub mod registry;
pub mod rep;
pub mod spec;
pub mod supplier;
pub mod tag;
pub mod vecmap;

/// Derives [`KatRep`] and [`Embed`] for structs with named fields.
pub use kat_derive::KatRep;

pub use crate::{
    decode::{Binder, Deferred, Depth},
    encode::Flow,
    errors::{Error, ErrorKind},
    kat::Kat,
    parser::Node,
    registry::Registry,
    rep::KatRep,
    spec::{Embed, FieldSpec, Spec, SpecBuilder},
    supplier::{Options, Supplier},
    tag::Tag,
    vecmap::VecMap,
};

/// Binds loosely typed data to `T` through the global registry.
///
/// See [`Supplier::cast`].
pub fn cast<T: KatRep, D: Into<Kat>>(data: D) -> Result<Option<T>, Error> {
    Supplier::ins().cast(data)
}

/// Decodes `src` fully through the global registry.
pub fn read<T: KatRep, S: AsRef<[u8]>>(src: S) -> Result<T, Error> { Supplier::ins().read(src) }

/// Decodes `src`, deferring the nested composites of [`Deferred`] fields.
pub fn down<T: KatRep, S: AsRef<[u8]>>(src: S) -> Result<T, Error> { Supplier::ins().down(src) }

/// Decodes `src`, binding every nested composite.
pub fn parse<T: KatRep, S: AsRef<[u8]>>(src: S) -> Result<T, Error> { Supplier::ins().parse(src) }

/// Encodes `value` through the global registry.
pub fn write<T: KatRep>(value: &T) -> Result<String, Error> { Supplier::ins().write(value) }
