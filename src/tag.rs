//! Type tags.
//!
//! Every value in Kat notation is introduced by a tag. Scalars use the one-letter
//! lowercase tags, arrays and maps use `A` and `M`, and nested entities use their
//! entity name.

use std::{borrow::Cow, fmt};

/// The type tag of a Kat value.
///
/// # Example
///
/// ```
/// use kat::Tag;
///
/// assert_eq!(Tag::scalar("i"), Tag::Int);
/// assert_eq!(Tag::block("A"), Tag::Array);
/// assert_eq!(Tag::block("User"), Tag::entity("User"));
/// assert_eq!(Tag::Double.to_string(), "d");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `i`, a 32-bit integer.
    Int,
    /// `l`, a 64-bit integer.
    Long,
    /// `f`, a 32-bit float.
    Float,
    /// `d`, a 64-bit float.
    Double,
    /// `s`, a string.
    Str,
    /// `b`, a boolean.
    Bool,
    /// `A`, an array block.
    Array,
    /// `M`, a map block.
    Map,
    /// A named entity block.
    Entity(Cow<'static, str>),
    /// A scalar tag this crate does not know. The literal is carried through as text.
    Opaque(String),
    /// A dynamically tagged value; each instance writes its own tag.
    Any,
}

impl Tag {
    /// Looks up a tag in scalar position, i.e. one that is followed by a literal.
    pub fn scalar(text: &str) -> Tag {
        match text {
            "i" => Tag::Int,
            "l" => Tag::Long,
            "f" => Tag::Float,
            "d" => Tag::Double,
            "s" => Tag::Str,
            "b" => Tag::Bool,
            other => Tag::Opaque(other.to_string()),
        }
    }

    /// Looks up a tag in block position, i.e. one that is followed by `{`.
    pub fn block(text: &str) -> Tag {
        match text {
            "A" => Tag::Array,
            "M" => Tag::Map,
            other => Tag::Entity(Cow::Owned(other.to_string())),
        }
    }

    /// The tag of an entity with a statically known name.
    pub const fn entity(name: &'static str) -> Tag { Tag::Entity(Cow::Borrowed(name)) }

    /// Whether values with this tag are written as `tag(literal)`.
    pub fn is_scalar(&self) -> bool {
        match self {
            Tag::Int | Tag::Long | Tag::Float | Tag::Double | Tag::Str | Tag::Bool => true,
            Tag::Opaque(_) => true,
            _ => false,
        }
    }

    /// Whether this is a scalar tag unknown to this crate.
    pub fn is_opaque(&self) -> bool {
        match self {
            Tag::Opaque(_) => true,
            _ => false,
        }
    }

    /// The wire spelling of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Int => "i",
            Tag::Long => "l",
            Tag::Float => "f",
            Tag::Double => "d",
            Tag::Str => "s",
            Tag::Bool => "b",
            Tag::Array => "A",
            Tag::Map => "M",
            Tag::Entity(name) => name,
            Tag::Opaque(text) => text,
            Tag::Any => "*",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_tags() {
        for (text, tag) in &[
            ("i", Tag::Int),
            ("l", Tag::Long),
            ("f", Tag::Float),
            ("d", Tag::Double),
            ("s", Tag::Str),
            ("b", Tag::Bool),
        ] {
            assert_eq!(&Tag::scalar(text), tag);
            assert_eq!(tag.as_str(), *text);
            assert!(tag.is_scalar());
        }
    }

    #[test]
    fn unknown_scalar_tags_are_opaque() {
        let tag = Tag::scalar("zz");
        assert!(tag.is_opaque());
        assert!(tag.is_scalar());
        assert_eq!(tag.to_string(), "zz");
    }

    #[test]
    fn block_tags() {
        assert_eq!(Tag::block("M"), Tag::Map);
        assert!(!Tag::block("Meta").is_scalar());
        assert_eq!(Tag::block("Meta").as_str(), "Meta");
    }
}
