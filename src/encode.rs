//! # Kat writer
//!
//! [`Flow`] accumulates Kat text. Values write themselves into a flow through
//! [`KatRep::write`](crate::KatRep::write); the flow takes care of heads, escaping and
//! the rendering of numbers.
//!
//! # Example
//!
//! ```
//! use kat::Flow;
//!
//! let mut flow = Flow::new();
//! flow.open("User", None);
//! flow.put_int(Some("id"), 1);
//! flow.put_str(Some("name"), "kraity");
//! flow.put_bool(Some("blocked"), true);
//! flow.close();
//!
//! assert_eq!(flow.finalize(), "User{i:id(1)s:name(kraity)b:blocked(1)}");
//! ```

use crate::{errors::Error, lexer::ESCAPE, registry::Registry, tag::Tag};
use bytes::Bytes;
use std::fmt::{Display, Write};

/// An output buffer for Kat text.
#[derive(Debug)]
pub struct Flow<'r> {
    out:      String,
    registry: &'r Registry,
}

impl Flow<'static> {
    /// Creates an empty flow that resolves entity specs in the global registry.
    pub fn new() -> Self { Flow::with_registry(Registry::global()) }
}

impl Default for Flow<'static> {
    fn default() -> Self { Flow::new() }
}

impl<'r> Flow<'r> {
    /// Creates an empty flow that resolves entity specs in `registry`.
    pub fn with_registry(registry: &'r Registry) -> Self {
        Flow {
            out: String::new(),
            registry,
        }
    }

    /// The registry entity specs are resolved in.
    pub fn registry(&self) -> &'r Registry { self.registry }

    fn head(&mut self, tag: &str, name: Option<&str>) {
        escape_name(&mut self.out, tag);
        if let Some(name) = name {
            self.out.push(':');
            escape_name(&mut self.out, name);
        }
    }

    /// Writes `tag:name(literal)`, or `tag(literal)` when `name` is `None`.
    ///
    /// # Arguments
    ///
    /// * `tag: &str` - The scalar tag.
    /// * `name: Option<&str>` - The member name, absent for array elements and roots.
    /// * `literal: &str` - The unescaped literal.
    pub fn put_scalar(&mut self, tag: &str, name: Option<&str>, literal: &str) {
        self.head(tag, name);
        self.out.push('(');
        escape_literal(&mut self.out, literal);
        self.out.push(')');
    }

    /// Writes a scalar whose literal is the [`Display`] rendering of `value`.
    ///
    /// Numbers never contain escapable characters, so nothing is escaped.
    pub fn put_number<N: Display>(&mut self, tag: &str, name: Option<&str>, value: N) {
        self.head(tag, name);
        // writing into a String cannot fail
        let _ = write!(self.out, "({})", value);
    }

    /// Writes an `i` scalar.
    pub fn put_int(&mut self, name: Option<&str>, i: i32) {
        self.put_number(Tag::Int.as_str(), name, i)
    }

    /// Writes an `l` scalar.
    pub fn put_long(&mut self, name: Option<&str>, l: i64) {
        self.put_number(Tag::Long.as_str(), name, l)
    }

    /// Writes an `f` scalar.
    pub fn put_f32(&mut self, name: Option<&str>, f: f32) {
        self.put_scalar(Tag::Float.as_str(), name, &fmt_f32(f))
    }

    /// Writes a `d` scalar.
    pub fn put_f64(&mut self, name: Option<&str>, d: f64) {
        self.put_scalar(Tag::Double.as_str(), name, &fmt_f64(d))
    }

    /// Writes a `b` scalar as `1` or `0`.
    pub fn put_bool(&mut self, name: Option<&str>, b: bool) {
        self.put_scalar(Tag::Bool.as_str(), name, if b { "1" } else { "0" })
    }

    /// Writes an `s` scalar.
    pub fn put_str(&mut self, name: Option<&str>, s: &str) {
        self.put_scalar(Tag::Str.as_str(), name, s)
    }

    /// Opens a block: `tag:name{`, or `tag{` when `name` is `None`.
    pub fn open(&mut self, tag: &str, name: Option<&str>) {
        self.head(tag, name);
        self.out.push('{');
    }

    /// Opens the block of an entity named `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Coercion`] when `entity` is empty or spells `A` or `M`, as the
    /// block would read back as something other than an entity.
    pub fn open_entity(&mut self, entity: &str, name: Option<&str>) -> Result<(), Error> {
        match Tag::block(entity) {
            Tag::Entity(_) if !entity.is_empty() => {
                self.open(entity, name);
                Ok(())
            }
            _ => Err(Error::coercion("entity", entity)),
        }
    }

    /// Writes a scalar under a tag this crate does not know.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Coercion`] when `tag` is empty or is one of the known scalar
    /// tags, as the literal would then read back under a different type.
    pub fn put_opaque(&mut self, tag: &str, name: Option<&str>, literal: &str) -> Result<(), Error> {
        if tag.is_empty() || !Tag::scalar(tag).is_opaque() {
            return Err(Error::coercion(tag, literal));
        }
        self.put_scalar(tag, name, literal);
        Ok(())
    }

    /// Closes the innermost open block.
    pub fn close(&mut self) { self.out.push('}') }

    /// The text written so far.
    pub fn as_str(&self) -> &str { &self.out }

    /// Returns the written text.
    pub fn finalize(self) -> String { self.out }

    /// Returns the written text as UTF-8 bytes.
    pub fn into_bytes(self) -> Bytes { Bytes::from(self.out) }
}

/// Appends `literal` to `out`, escaping the characters that would end it early.
pub fn escape_literal(out: &mut String, literal: &str) {
    for c in literal.chars() {
        if c == ESCAPE || c == '(' || c == ')' {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// Appends `name` to `out`, escaping every character that cannot appear in a bare word.
pub fn escape_name(out: &mut String, name: &str) {
    for c in name.chars() {
        match c {
            '(' | ')' | '{' | '}' | ':' => out.push(ESCAPE),
            c if c == ESCAPE || c.is_whitespace() || c.is_control() => out.push(ESCAPE),
            _ => {}
        }
        out.push(c);
    }
}

/// Renders an `f32` so that it always reads back as a float, e.g. `4.0` rather than `4`.
pub fn fmt_f32(f: f32) -> String { with_point(f.to_string(), f.is_finite()) }

/// Renders an `f64` so that it always reads back as a float, e.g. `5.0` rather than `5`.
pub fn fmt_f64(d: f64) -> String { with_point(d.to_string(), d.is_finite()) }

fn with_point(mut s: String, finite: bool) -> String {
    if finite && !s.contains('.') {
        s.push_str(".0");
    }
    s
}
