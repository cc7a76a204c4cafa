//! Parsing of structured literal strings.
//!
//! Raw source values for list- and map-shaped fields arrive as literal
//! expressions such as `"[1, 2, 3]"` or `"{'key': 'value'}"`. This module
//! parses that notation: quoted strings, integers, floats, booleans, lists,
//! maps, and the tuple/set spellings (both surface as lists).

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;
use toml::{Table, Value};

/// Errors produced while parsing a structured literal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LiteralError {
    #[error("unexpected end of literal")]
    UnexpectedEnd,

    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unsupported escape sequence '\\{0}'")]
    UnsupportedEscape(char),

    #[error("invalid scalar token {0:?}")]
    InvalidScalar(String),

    #[error("map keys must be string literals")]
    NonStringKey,

    #[error("trailing characters after literal at offset {0}")]
    TrailingCharacters(usize),
}

/// Parses a complete literal expression.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    let value = parser.value()?;
    parser.skip_whitespace();
    match parser.peek() {
        Some((offset, _)) => Err(LiteralError::TrailingCharacters(offset)),
        None => Ok(value),
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some((_, '[')) => {
                self.bump();
                self.sequence(']').map(Value::Array)
            }
            Some((_, '(')) => {
                self.bump();
                self.sequence(')').map(Value::Array)
            }
            Some((_, '{')) => {
                self.bump();
                self.map_or_set()
            }
            Some((_, quote @ ('\'' | '"'))) => {
                self.bump();
                self.string(quote).map(Value::String)
            }
            Some(_) => self.scalar(),
        }
    }

    /// Parses the elements of a `[...]` or `(...)` after the opener.
    /// Trailing commas are accepted.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some((_, c)) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                _ => {}
            }

            items.push(self.value()?);
            self.skip_whitespace();

            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some((_, ',')) => {}
                Some((_, c)) if c == close => return Ok(items),
                Some((offset, c)) => return Err(LiteralError::UnexpectedChar(c, offset)),
            }
        }
    }

    /// Parses the body of a `{...}` literal: a map when the first element is
    /// followed by `:`, otherwise a set (surfaced as a list). `{}` is the
    /// empty map.
    fn map_or_set(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        if matches!(self.peek(), Some((_, '}'))) {
            self.bump();
            return Ok(Value::Table(Table::new()));
        }

        let first = self.value()?;
        self.skip_whitespace();
        match self.peek() {
            Some((_, ':')) => {
                self.bump();
                self.map(first)
            }
            _ => self.set(first),
        }
    }

    fn map(&mut self, first_key: Value) -> Result<Value, LiteralError> {
        let mut table = Table::new();
        let mut key = match first_key {
            Value::String(key) => key,
            _ => return Err(LiteralError::NonStringKey),
        };

        loop {
            self.skip_whitespace();
            let value = self.value()?;
            table.insert(key, value);
            self.skip_whitespace();

            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some((_, '}')) => return Ok(Value::Table(table)),
                Some((_, ',')) => {}
                Some((offset, c)) => return Err(LiteralError::UnexpectedChar(c, offset)),
            }

            self.skip_whitespace();
            if matches!(self.peek(), Some((_, '}'))) {
                self.bump();
                return Ok(Value::Table(table));
            }

            key = match self.value()? {
                Value::String(key) => key,
                _ => return Err(LiteralError::NonStringKey),
            };
            self.skip_whitespace();
            match self.bump() {
                Some((_, ':')) => {}
                Some((offset, c)) => return Err(LiteralError::UnexpectedChar(c, offset)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn set(&mut self, first: Value) -> Result<Value, LiteralError> {
        let mut items = vec![first];
        loop {
            self.skip_whitespace();
            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some((_, '}')) => return Ok(Value::Array(items)),
                Some((_, ',')) => {}
                Some((offset, c)) => return Err(LiteralError::UnexpectedChar(c, offset)),
            }

            self.skip_whitespace();
            if matches!(self.peek(), Some((_, '}'))) {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LiteralError::UnterminatedString),
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, '\\')) => match self.bump() {
                    None => return Err(LiteralError::UnterminatedString),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                    Some((_, c)) => return Err(LiteralError::UnsupportedEscape(c)),
                },
                Some((_, c)) => out.push(c),
            }
        }
    }

    /// Parses an unquoted token: a boolean (spelled either way) or a number.
    fn scalar(&mut self) -> Result<Value, LiteralError> {
        let mut token = String::new();
        while let Some((_, c)) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ':' | ']' | ')' | '}') {
                break;
            }
            token.push(c);
            self.bump();
        }

        match token.as_str() {
            "" => match self.peek() {
                Some((offset, c)) => Err(LiteralError::UnexpectedChar(c, offset)),
                None => Err(LiteralError::UnexpectedEnd),
            },
            "True" | "true" => Ok(Value::Boolean(true)),
            "False" | "false" => Ok(Value::Boolean(false)),
            _ => {
                if let Ok(integer) = token.parse::<i64>() {
                    return Ok(Value::Integer(integer));
                }
                if let Ok(float) = token.parse::<f64>() {
                    return Ok(Value::Float(float));
                }
                Err(LiteralError::InvalidScalar(token))
            }
        }
    }
}
