//! Parser for the header dictionary.
//!
//! The header is a Python dictionary literal. Only the subset that `.npy` writers emit is
//! accepted:
//!
//! ```text
//! dict   := '{' [ entry { ',' entry } [ ',' ] ] '}'
//! entry  := string ':' value
//! value  := string | 'True' | 'False' | 'None' | integer | tuple
//! tuple  := '(' [ integer { ',' integer } [ ',' ] ] ')'
//! string := "'" { char } "'" | '"' { char } '"'
//! ```
//!
//! Whitespace is allowed between every token and after the closing brace (the space padding and
//! the terminating newline). Keys may appear in any order; keys other than `descr`,
//! `fortran_order` and `shape` are skipped.
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    array::IxDyn,
    npy::header::{Descr, Header},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderParseError {
    #[error("unexpected end of header")]
    UnexpectedEnd,
    #[error("unexpected {found:?} at byte {pos}, expected {expected}")]
    UnexpectedChar {
        found: char,
        pos: usize,
        expected: &'static str,
    },
    #[error("integer out of range at byte {pos}")]
    IntegerOverflow { pos: usize },
    #[error("trailing input at byte {pos}")]
    TrailingInput { pos: usize },
    #[error("missing key '{0}'")]
    MissingKey(&'static str),
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
    #[error("key '{key}' must be {expected}")]
    WrongValueType {
        key: &'static str,
        expected: &'static str,
    },
    #[error("invalid descr '{0}'")]
    InvalidDescr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    Bool(bool),
    None,
    Int(usize),
    Tuple(IxDyn),
}

struct Cursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text: text.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.text.get(self.pos) {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.text.get(self.pos).copied()
    }

    fn unexpected(&self, expected: &'static str) -> HeaderParseError {
        match self.text.get(self.pos) {
            Some(&b) => HeaderParseError::UnexpectedChar {
                found: b as char,
                pos: self.pos,
                expected,
            },
            None => HeaderParseError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), HeaderParseError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Consume `byte` if it is the next token.
    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn string(&mut self) -> Result<String, HeaderParseError> {
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.unexpected("a quoted string")),
        };
        self.pos += 1;
        let start = self.pos;
        let len = self.text[start..]
            .iter()
            .position(|&b| b == quote)
            .ok_or(HeaderParseError::UnexpectedEnd)?;
        self.pos = start + len + 1;
        Ok(String::from_utf8_lossy(&self.text[start..start + len]).into_owned())
    }

    fn integer(&mut self) -> Result<usize, HeaderParseError> {
        self.skip_ws();
        let start = self.pos;
        let digits = self.text[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return Err(self.unexpected("an integer"));
        }
        self.pos += digits;
        self.text[start..self.pos]
            .iter()
            .try_fold(0usize, |acc, &b| {
                acc.checked_mul(10)?.checked_add(usize::from(b - b'0'))
            })
            .ok_or(HeaderParseError::IntegerOverflow { pos: start })
    }

    fn keyword(&mut self) -> Result<Value, HeaderParseError> {
        self.skip_ws();
        let rest = &self.text[self.pos..];
        for (word, value) in [
            (&b"True"[..], Value::Bool(true)),
            (&b"False"[..], Value::Bool(false)),
            (&b"None"[..], Value::None),
        ] {
            if rest.starts_with(word) {
                self.pos += word.len();
                return Ok(value);
            }
        }
        Err(self.unexpected("a value"))
    }

    fn tuple(&mut self) -> Result<IxDyn, HeaderParseError> {
        self.expect(b'(', "'('")?;
        let mut items = SmallVec::new();
        loop {
            if self.eat(b')') {
                return Ok(items);
            }
            items.push(self.integer()?);
            if self.eat(b')') {
                return Ok(items);
            }
            self.expect(b',', "',' or ')'")?;
        }
    }

    fn value(&mut self) -> Result<Value, HeaderParseError> {
        match self.peek() {
            Some(b'\'' | b'"') => self.string().map(Value::Str),
            Some(b'(') => self.tuple().map(Value::Tuple),
            Some(b) if b.is_ascii_digit() => self.integer().map(Value::Int),
            Some(_) => self.keyword(),
            None => Err(HeaderParseError::UnexpectedEnd),
        }
    }

    fn dict(&mut self) -> Result<Vec<(String, Value)>, HeaderParseError> {
        self.expect(b'{', "'{'")?;
        let mut entries = Vec::new();
        loop {
            if self.eat(b'}') {
                break;
            }
            let key = self.string()?;
            self.expect(b':', "':'")?;
            let value = self.value()?;
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(HeaderParseError::DuplicateKey(key));
            }
            entries.push((key, value));
            if self.eat(b'}') {
                break;
            }
            self.expect(b',', "',' or '}'")?;
        }
        if self.peek().is_some() {
            return Err(HeaderParseError::TrailingInput { pos: self.pos });
        }
        Ok(entries)
    }
}

/// Parse the header dictionary text (padding and newline included).
pub fn parse_header(text: &str) -> Result<Header, HeaderParseError> {
    let entries = Cursor::new(text).dict()?;

    let mut descr = None;
    let mut fortran_order = None;
    let mut shape = None;
    for (key, value) in entries {
        match (key.as_str(), value) {
            ("descr", Value::Str(s)) => {
                descr = Some(s.parse::<Descr>()?);
            }
            ("descr", _) => {
                return Err(HeaderParseError::WrongValueType {
                    key: "descr",
                    expected: "a string",
                });
            }
            ("fortran_order", Value::Bool(b)) => fortran_order = Some(b),
            ("fortran_order", _) => {
                return Err(HeaderParseError::WrongValueType {
                    key: "fortran_order",
                    expected: "True or False",
                });
            }
            ("shape", Value::Tuple(dims)) => shape = Some(dims),
            ("shape", _) => {
                return Err(HeaderParseError::WrongValueType {
                    key: "shape",
                    expected: "a tuple of integers",
                });
            }
            _ => {}
        }
    }

    Ok(Header {
        descr: descr.ok_or(HeaderParseError::MissingKey("descr"))?,
        fortran_order: fortran_order.ok_or(HeaderParseError::MissingKey("fortran_order"))?,
        shape: shape.ok_or(HeaderParseError::MissingKey("shape"))?,
    })
}
