//! Errors raised while tokenizing, parsing, resolving specs, and binding.
//!
//! Every fallible operation in this crate returns [`Error`]. The variants follow the
//! stages of the pipeline: the tokenizer raises [`Error::Lex`], the parser raises
//! [`Error::Syntax`], the registry raises [`Error::Spec`] and the binder raises
//! [`Error::UnknownField`] and [`Error::Coercion`].

use failure::Fail;

#[derive(Debug, Clone, PartialEq, Eq, Fail)]
/// An error encountered anywhere in the Kat pipeline.
pub enum Error {
    /// The input is not a valid token stream: an unterminated literal, an illegal
    /// character, or bytes that are not UTF-8.
    #[fail(display = "lex error at byte {}: {}", offset, reason)]
    Lex { offset: usize, reason: String },

    /// The tokens do not nest properly, or tokens remain after the root value.
    #[fail(display = "syntax error at byte {}: {}", offset, reason)]
    Syntax { offset: usize, reason: String },

    /// A type declares a malformed schema.
    #[fail(display = "invalid spec for `{}`: {}", entity, reason)]
    Spec { entity: String, reason: String },

    /// A sealed spec received a field it does not declare.
    #[fail(display = "`{}` is sealed and has no field `{}`", entity, field)]
    UnknownField { entity: String, field: String },

    /// A literal is incompatible with the declared tag of its target.
    #[fail(
        display = "cannot coerce `{}` to `{}` for field `{}`",
        literal, tag, field
    )]
    Coercion {
        field: String,
        tag: String,
        literal: String,
    },
}

/// The stage that produced an [`Error`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Syntax,
    Spec,
    UnknownField,
    Coercion,
}

impl Error {
    pub(crate) fn lex<S: Into<String>>(offset: usize, reason: S) -> Self {
        Error::Lex {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn syntax<S: Into<String>>(offset: usize, reason: S) -> Self {
        Error::Syntax {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn spec<E: Into<String>, S: Into<String>>(entity: E, reason: S) -> Self {
        Error::Spec {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// A coercion failure not yet attributed to a field.
    pub(crate) fn coercion<T: ToString, L: Into<String>>(tag: T, literal: L) -> Self {
        Error::Coercion {
            field: String::new(),
            tag: tag.to_string(),
            literal: literal.into(),
        }
    }

    /// Returns the stage that produced this error.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    ///
    /// let err = kat::parse::<i32, _>("i(abc)").unwrap_err();
    ///
    /// assert_eq!(err.kind(), ErrorKind::Coercion);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Lex { .. } => ErrorKind::Lex,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::Spec { .. } => ErrorKind::Spec,
            Error::UnknownField { .. } => ErrorKind::UnknownField,
            Error::Coercion { .. } => ErrorKind::Coercion,
        }
    }

    /// Prefixes the field path of a coercion error with `name`, so that an error deep
    /// inside nested entities reads `owner.id`.
    pub(crate) fn in_field(self, name: &str) -> Self {
        match self {
            Error::Coercion {
                field,
                tag,
                literal,
            } => {
                let field = if field.is_empty() {
                    name.to_string()
                } else if field.starts_with('[') {
                    format!("{}{}", name, field)
                } else {
                    format!("{}.{}", name, field)
                };
                Error::Coercion {
                    field,
                    tag,
                    literal,
                }
            }
            other => other,
        }
    }

    /// Prefixes the field path of a coercion error with an array index.
    pub(crate) fn at_index(self, index: usize) -> Self {
        match self {
            Error::Coercion {
                field,
                tag,
                literal,
            } => {
                let field = if field.is_empty() || field.starts_with('[') {
                    format!("[{}]{}", index, field)
                } else {
                    format!("[{}].{}", index, field)
                };
                Error::Coercion {
                    field,
                    tag,
                    literal,
                }
            }
            other => other,
        }
    }
}
