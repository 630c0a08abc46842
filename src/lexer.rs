//! # Kat tokenizer
//!
//! Splits Kat text into [`Token`]s. The lexer is lazy: tokens are produced one at a
//! time through [`Iterator`], and the first error ends the stream.
//!
//! # Example
//!
//! ```
//! use kat::lexer::{Lexer, TokenKind::*};
//!
//! let kinds: Vec<_> = Lexer::new("User{i:id(1)}")
//!     .map(|t| t.unwrap().kind)
//!     .collect();
//!
//! assert_eq!(kinds, vec![Name, LBrace, Tag, Name, LParen, Literal, RParen, RBrace]);
//! ```

use crate::errors::Error;
use std::{borrow::Cow, collections::VecDeque, fmt};

/// The escape character, valid inside literals and names.
pub const ESCAPE: char = '^';

/// The kind of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A word immediately followed by `:`. The colon is consumed.
    Tag,
    /// A bare word: a field name, an entity name, or an anonymous tag.
    Name,
    /// The text between `(` and `)`, unescaped.
    Literal,
    LParen,
    RParen,
    LBrace,
    RBrace,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Tag => "tag",
            TokenKind::Name => "name",
            TokenKind::Literal => "literal",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
        })
    }
}

/// A lexical unit of Kat text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The lexeme with escapes removed. Borrowed unless an escape had to be removed.
    pub text: Cow<'a, str>,
    /// Byte offset of the token in the input.
    pub offset: usize,
}

/// A lazy tokenizer over Kat text.
#[derive(Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    /// Literal and `)` tokens scanned together with their `(`.
    pending: VecDeque<Token<'a>>,
    done: bool,
}

fn is_word_char(c: char) -> bool {
    match c {
        '(' | ')' | '{' | '}' | ':' => false,
        c => !c.is_whitespace() && !c.is_control(),
    }
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `src`.
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            pos: 0,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Creates a lexer over raw bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lex`] at the first byte that is not valid UTF-8.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, Error> {
        match std::str::from_utf8(bytes) {
            Ok(src) => Ok(Lexer::new(src)),
            Err(e) => Err(Error::lex(e.valid_up_to(), "input is not valid UTF-8")),
        }
    }

    /// The input this lexer reads from.
    pub fn source(&self) -> &'a str { self.src }

    #[inline]
    fn peek(&self) -> Option<char> { self.src[self.pos..].chars().next() }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: Cow::Borrowed(&self.src[start..self.pos]),
            offset: start,
        }
    }

    /// Scans a literal whose `(` sits at `open`, queueing the literal and `)`.
    fn literal(&mut self, open: usize) -> Result<(), Error> {
        let start = self.pos;
        let mut owned: Option<String> = None;
        loop {
            match self.bump() {
                None => return Err(Error::lex(open, "unterminated literal")),
                Some(ESCAPE) => {
                    let at = self.pos - ESCAPE.len_utf8();
                    match self.bump() {
                        None => return Err(Error::lex(open, "unterminated literal")),
                        Some(c) => owned
                            .get_or_insert_with(|| self.src[start..at].to_string())
                            .push(c),
                    }
                }
                Some(')') => {
                    let end = self.pos - 1;
                    let text = match owned {
                        Some(s) => Cow::Owned(s),
                        None => Cow::Borrowed(&self.src[start..end]),
                    };
                    self.pending.push_back(Token {
                        kind: TokenKind::Literal,
                        text,
                        offset: start,
                    });
                    self.pending.push_back(Token {
                        kind: TokenKind::RParen,
                        text: Cow::Borrowed(")"),
                        offset: end,
                    });
                    return Ok(());
                }
                Some(c) => {
                    if let Some(buf) = owned.as_mut() {
                        buf.push(c)
                    }
                }
            }
        }
    }

    /// Scans a word starting at the current position.
    fn word(&mut self) -> Result<Token<'a>, Error> {
        let start = self.pos;
        let mut owned: Option<String> = None;
        while let Some(c) = self.peek() {
            if c == ESCAPE {
                let at = self.pos;
                self.pos += c.len_utf8();
                match self.bump() {
                    None => return Err(Error::lex(at, "dangling escape at end of input")),
                    Some(e) => owned
                        .get_or_insert_with(|| self.src[start..at].to_string())
                        .push(e),
                }
            } else if is_word_char(c) {
                self.pos += c.len_utf8();
                if let Some(buf) = owned.as_mut() {
                    buf.push(c)
                }
            } else {
                break;
            }
        }
        let end = self.pos;

        let kind = if self.peek() == Some(':') {
            self.pos += 1;
            TokenKind::Tag
        } else {
            TokenKind::Name
        };

        let text = match owned {
            Some(s) => Cow::Owned(s),
            None => Cow::Borrowed(&self.src[start..end]),
        };

        Ok(Token {
            kind,
            text,
            offset: start,
        })
    }

    fn scan(&mut self) -> Option<Result<Token<'a>, Error>> {
        self.skip_whitespace();
        let start = self.pos;
        let c = self.bump()?;
        let token = match c {
            '{' => Ok(self.token(TokenKind::LBrace, start)),
            '}' => Ok(self.token(TokenKind::RBrace, start)),
            '(' => {
                let open = self.token(TokenKind::LParen, start);
                self.literal(start).map(|()| open)
            }
            ')' => Err(Error::lex(start, "unbalanced `)`")),
            ':' => Err(Error::lex(start, "`:` must directly follow a tag")),
            c if c.is_control() => Err(Error::lex(
                start,
                format!("illegal character {:?}", c),
            )),
            _ => {
                self.pos = start;
                self.word()
            }
        };
        Some(token)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.pop_front() {
            return Some(Ok(token));
        }
        if self.done {
            return None;
        }
        let next = self.scan();
        match next {
            Some(Err(_)) | None => self.done = true,
            _ => {}
        }
        next
    }
}
