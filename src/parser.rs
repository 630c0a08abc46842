//! # Kat parser
//!
//! Builds a [`Node`] tree from the token stream. The parser is purely structural: it
//! checks nesting, but performs no type coercion and no alias resolution.
//!
//! The grammar, informally:
//!
//! ```text
//! root     := element
//! element  := NAME '(' literal ')' | NAME '{' block '}'
//! member   := TAG NAME? ('(' literal ')' | '{' block '}')
//! block    := element*     when the tag is `A`
//!           | member*      otherwise (`M` or an entity name)
//! ```
//!
//! # Example
//!
//! ```
//! use kat::{parser::parse, Node, Tag};
//!
//! let node = parse("User{i:id(1)}").unwrap();
//!
//! assert_eq!(
//!     node,
//!     Node::Entity {
//!         name:   "User".to_string(),
//!         fields: vec![(
//!             "id".to_string(),
//!             Node::Scalar {
//!                 tag:  Tag::Int,
//!                 text: "1".to_string(),
//!             }
//!         )],
//!     }
//! );
//! ```

use crate::{
    decode::Binder,
    encode::Flow,
    errors::Error,
    kat::Kat,
    lexer::{Lexer, Token, TokenKind},
    registry::Registry,
    rep::KatRep,
    tag::Tag,
};
use std::{fmt, iter::Peekable};

/// Default limit on how deeply blocks may nest.
pub const MAX_NESTING: usize = 512;

/// The abstract value tree produced by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// `tag(literal)`, with the literal unescaped.
    Scalar { tag: Tag, text: String },
    /// `Name{...}`; fields keep their input order and may repeat.
    Entity {
        name:   String,
        fields: Vec<(String, Node)>,
    },
    /// `A{...}`.
    Array(Vec<Node>),
    /// `M{...}`.
    Map(Vec<(String, Node)>),
}

impl Node {
    /// The tag this node was written with.
    pub fn tag(&self) -> Tag {
        match self {
            Node::Scalar { tag, .. } => tag.clone(),
            Node::Entity { name, .. } => Tag::block(name),
            Node::Array(_) => Tag::Array,
            Node::Map(_) => Tag::Map,
        }
    }

    /// Whether this node is an entity, array or map.
    pub fn is_composite(&self) -> bool {
        match self {
            Node::Scalar { .. } => false,
            _ => true,
        }
    }

    /// The literal of a scalar node, or a coercion error naming `tag` for composites.
    pub(crate) fn into_literal(self, tag: &Tag) -> Result<String, Error> {
        match self {
            Node::Scalar { text, .. } => Ok(text),
            other => Err(Error::coercion(tag, other.to_string())),
        }
    }
}

impl KatRep for Node {
    fn tag() -> Tag { Tag::Any }

    fn write(&self, flow: &mut Flow<'_>, name: Option<&str>) -> Result<(), Error> {
        match self {
            Node::Scalar {
                tag: Tag::Opaque(tag),
                text,
            } => flow.put_opaque(tag, name, text)?,
            Node::Scalar { tag, text } => flow.put_scalar(tag.as_str(), name, text),
            Node::Entity { name: entity, fields } => {
                flow.open_entity(entity, name)?;
                for (key, node) in fields {
                    node.write(flow, Some(key))?;
                }
                flow.close();
            }
            Node::Array(items) => {
                flow.open(Tag::Array.as_str(), name);
                for node in items {
                    node.write(flow, None)?;
                }
                flow.close();
            }
            Node::Map(pairs) => {
                flow.open(Tag::Map.as_str(), name);
                for (key, node) in pairs {
                    node.write(flow, Some(key))?;
                }
                flow.close();
            }
        }
        Ok(())
    }

    fn bind(node: Node, _: &Binder<'_>) -> Result<Self, Error> { Ok(node) }

    fn to_kat(&self, registry: &Registry) -> Result<Kat, Error> {
        Binder::new(registry, Default::default()).bind(self.clone())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut flow = Flow::new();
        self.write(&mut flow, None).map_err(|_| fmt::Error)?;
        f.write_str(flow.as_str())
    }
}

/// A recursive-descent parser over a [`Lexer`].
#[derive(Debug)]
pub struct Parser<'a> {
    tokens:      Peekable<Lexer<'a>>,
    end:         usize,
    max_nesting: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `src`.
    pub fn new(src: &'a str) -> Self { Parser::from_lexer(Lexer::new(src)) }

    /// Creates a parser over raw bytes, which must be UTF-8.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, Error> {
        Ok(Parser::from_lexer(Lexer::from_bytes(bytes)?))
    }

    fn from_lexer(lexer: Lexer<'a>) -> Self {
        Parser {
            end:         lexer.source().len(),
            tokens:      lexer.peekable(),
            max_nesting: MAX_NESTING,
        }
    }

    /// Sets how deeply blocks may nest before parsing fails.
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Consumes the whole token stream, producing exactly one root node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lex`] if the tokenizer fails, and [`Error::Syntax`] if the tokens
    /// are not well nested or if anything follows the root value.
    pub fn parse(mut self) -> Result<Node, Error> {
        let root = self.element(0)?;
        match self.next()? {
            None => Ok(root),
            Some(token) => Err(Error::syntax(
                token.offset,
                format!("unexpected {} after the root value", token.kind),
            )),
        }
    }

    fn next(&mut self) -> Result<Option<Token<'a>>, Error> {
        match self.tokens.next() {
            None => Ok(None),
            Some(token) => token.map(Some),
        }
    }

    fn peek_kind(&mut self) -> Result<Option<TokenKind>, Error> {
        match self.tokens.peek() {
            None => Ok(None),
            Some(Ok(token)) => Ok(Some(token.kind)),
            Some(Err(e)) => Err(e.clone()),
        }
    }

    fn eof(&self, expected: &str) -> Error {
        Error::syntax(
            self.end,
            format!("expected {}, found end of input", expected),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'a>, Error> {
        match self.next()? {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(Error::syntax(
                token.offset,
                format!("expected {}, found {}", expected, token.kind),
            )),
            None => Err(self.eof(expected)),
        }
    }

    fn scalar(&mut self, tag: Tag) -> Result<Node, Error> {
        let literal = self.expect(TokenKind::Literal, "a literal")?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(Node::Scalar {
            tag,
            text: literal.text.into_owned(),
        })
    }

    fn element(&mut self, depth: usize) -> Result<Node, Error> {
        let head = self.expect(TokenKind::Name, "a value")?;
        match self.next()? {
            Some(ref t) if t.kind == TokenKind::LParen => self.scalar(Tag::scalar(&head.text)),
            Some(ref t) if t.kind == TokenKind::LBrace => {
                self.block(&head.text, head.offset, depth + 1)
            }
            Some(t) => Err(Error::syntax(
                t.offset,
                format!("expected `(` or `{{` after `{}`, found {}", head.text, t.kind),
            )),
            None => Err(self.eof("`(` or `{`")),
        }
    }

    fn member(&mut self, depth: usize) -> Result<(String, Node), Error> {
        let tag = self.expect(TokenKind::Tag, "a tagged member")?;
        let name = match self.peek_kind()? {
            Some(TokenKind::Name) => self.expect(TokenKind::Name, "a name")?.text.into_owned(),
            _ => String::new(),
        };
        let node = match self.next()? {
            Some(ref t) if t.kind == TokenKind::LParen => self.scalar(Tag::scalar(&tag.text))?,
            Some(ref t) if t.kind == TokenKind::LBrace => {
                self.block(&tag.text, tag.offset, depth + 1)?
            }
            Some(t) => {
                return Err(Error::syntax(
                    t.offset,
                    format!("expected `(` or `{{` after `{}`, found {}", name, t.kind),
                ))
            }
            None => return Err(self.eof("`(` or `{`")),
        };
        Ok((name, node))
    }

    /// Parses the inside of a block whose `{` has been consumed, through its `}`.
    fn block(&mut self, tag: &str, offset: usize, depth: usize) -> Result<Node, Error> {
        if depth > self.max_nesting {
            return Err(Error::syntax(
                offset,
                format!("blocks nest deeper than {}", self.max_nesting),
            ));
        }
        match Tag::block(tag) {
            Tag::Array => {
                let mut items = Vec::new();
                loop {
                    match self.peek_kind()? {
                        Some(TokenKind::RBrace) => {
                            self.next()?;
                            return Ok(Node::Array(items));
                        }
                        Some(_) => items.push(self.element(depth)?),
                        None => return Err(self.eof("`}`")),
                    }
                }
            }
            Tag::Map => Ok(Node::Map(self.members(depth)?)),
            _ => Ok(Node::Entity {
                name:   tag.to_string(),
                fields: self.members(depth)?,
            }),
        }
    }

    fn members(&mut self, depth: usize) -> Result<Vec<(String, Node)>, Error> {
        let mut fields = Vec::new();
        loop {
            match self.peek_kind()? {
                Some(TokenKind::RBrace) => {
                    self.next()?;
                    return Ok(fields);
                }
                Some(_) => fields.push(self.member(depth)?),
                None => return Err(self.eof("`}`")),
            }
        }
    }
}

/// Parses Kat text into a [`Node`] tree.
pub fn parse(src: &str) -> Result<Node, Error> { Parser::new(src).parse() }

/// Parses UTF-8 Kat bytes into a [`Node`] tree.
pub fn parse_bytes(bytes: &[u8]) -> Result<Node, Error> { Parser::from_bytes(bytes)?.parse() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn scalar(tag: Tag, text: &str) -> Node {
        Node::Scalar {
            tag,
            text: text.to_string(),
        }
    }

    #[test]
    fn nested_entity() {
        let node = parse("User{i:id(1)Meta:meta{s:tag(x)}A:ids{i(1)i(2)}M:m{b:ok(1)}}").unwrap();
        assert_eq!(
            node,
            Node::Entity {
                name:   "User".to_string(),
                fields: vec![
                    ("id".to_string(), scalar(Tag::Int, "1")),
                    (
                        "meta".to_string(),
                        Node::Entity {
                            name:   "Meta".to_string(),
                            fields: vec![("tag".to_string(), scalar(Tag::Str, "x"))],
                        }
                    ),
                    (
                        "ids".to_string(),
                        Node::Array(vec![scalar(Tag::Int, "1"), scalar(Tag::Int, "2")])
                    ),
                    (
                        "m".to_string(),
                        Node::Map(vec![("ok".to_string(), scalar(Tag::Bool, "1"))])
                    ),
                ],
            }
        );
    }

    #[test]
    fn root_array_of_entities() {
        let node = parse("A{User{i:id(1)}User{}s(x)}").unwrap();
        match node {
            Node::Array(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[2], scalar(Tag::Str, "x"));
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }

    #[test]
    fn root_scalar() { assert_eq!(parse("l(42)").unwrap(), scalar(Tag::Long, "42")); }

    #[test]
    fn unknown_tags_are_opaque() {
        let node = parse("M{zz:k(raw)}").unwrap();
        assert_eq!(
            node,
            Node::Map(vec![("k".to_string(), scalar(Tag::Opaque("zz".into()), "raw"))])
        );
    }

    #[test]
    fn empty_names_and_literals() {
        let node = parse("M{s:()}").unwrap();
        assert_eq!(node, Node::Map(vec![(String::new(), scalar(Tag::Str, ""))]));
    }

    #[test]
    fn trailing_tokens() {
        let err = parse("User{}User{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        match err {
            Error::Syntax { offset, .. } => assert_eq!(offset, 6),
            _ => unreachable!(),
        }
    }

    #[test]
    fn unclosed_blocks() {
        assert_eq!(parse("User{i:id(1)").unwrap_err().kind(), ErrorKind::Syntax);
        assert_eq!(parse("A{i(1)").unwrap_err().kind(), ErrorKind::Syntax);
        assert_eq!(parse("").unwrap_err().kind(), ErrorKind::Syntax);
    }

    #[test]
    fn malformed_members() {
        // members need a tag, elements must not have one
        assert_eq!(parse("User{id(1)}").unwrap_err().kind(), ErrorKind::Syntax);
        assert_eq!(parse("A{i:x(1)}").unwrap_err().kind(), ErrorKind::Syntax);
        assert_eq!(parse("User{i:id}").unwrap_err().kind(), ErrorKind::Syntax);
        assert_eq!(parse("}").unwrap_err().kind(), ErrorKind::Syntax);
    }

    #[test]
    fn lex_errors_pass_through() {
        assert_eq!(parse("User{s:x(1}").unwrap_err().kind(), ErrorKind::Lex);
    }

    #[test]
    fn nesting_limit() {
        let deep = format!("{}{}", "A{".repeat(10), "}".repeat(10));
        assert!(Parser::new(&deep).with_max_nesting(10).parse().is_ok());
        let err = Parser::new(&deep).with_max_nesting(9).parse().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn display_writes_kat() {
        let text = "User{i:id(1)A:tags{s(a^))}M:m{}}";
        assert_eq!(parse(text).unwrap().to_string(), text);
    }
}
