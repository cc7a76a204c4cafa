use thiserror::Error;
use toml::Value;

use super::literal::{self, LiteralError};

/// The closed set of target shapes the coercion engine can produce.
///
/// Anything outside this set is handled through a custom transform on the
/// field or schema, never by guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    /// The raw string, unchanged.
    #[default]
    Str,
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit float.
    Float,
    /// A boolean, from a fixed set of literals.
    Bool,
    /// A list parsed from a structured literal; element types are not
    /// enforced, only the outer shape.
    List,
    /// A string-keyed map parsed from a structured literal.
    Map,
}

/// Errors produced by the coercion engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoerceError {
    #[error("{0:?} is not a recognized boolean (expected true/false, yes/no or 1/0)")]
    InvalidBool(String),

    #[error("invalid integer {raw:?}: {source}")]
    InvalidInt {
        raw: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid float {raw:?}: {source}")]
    InvalidFloat {
        raw: String,
        source: std::num::ParseFloatError,
    },

    #[error("invalid structured literal {raw:?}: {source}")]
    InvalidLiteral { raw: String, source: LiteralError },

    #[error("{0:?} is not a list literal")]
    NotAList(String),

    #[error("{0:?} is not a map literal")]
    NotAMap(String),
}

/// Coerces a raw source string to the wanted kind.
///
/// Strings pass through untouched. Numbers are parsed directly. Booleans
/// match a fixed, case-insensitive set of literals. Lists and maps are
/// parsed as structured literals, checking the outer shape only.
pub fn coerce(raw: &str, kind: Kind) -> Result<Value, CoerceError> {
    match kind {
        Kind::Str => Ok(Value::String(raw.to_string())),
        Kind::Bool => coerce_bool(raw),
        Kind::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|source| CoerceError::InvalidInt {
                raw: raw.to_string(),
                source,
            }),
        Kind::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|source| CoerceError::InvalidFloat {
                raw: raw.to_string(),
                source,
            }),
        Kind::List => match parse_structured(raw)? {
            Value::Array(items) => Ok(Value::Array(items)),
            _ => Err(CoerceError::NotAList(raw.to_string())),
        },
        Kind::Map => match parse_structured(raw)? {
            Value::Table(table) => Ok(Value::Table(table)),
            _ => Err(CoerceError::NotAMap(raw.to_string())),
        },
    }
}

fn coerce_bool(raw: &str) -> Result<Value, CoerceError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(Value::Boolean(true)),
        "false" | "no" | "0" => Ok(Value::Boolean(false)),
        _ => Err(CoerceError::InvalidBool(raw.to_string())),
    }
}

fn parse_structured(raw: &str) -> Result<Value, CoerceError> {
    literal::parse(raw).map_err(|source| CoerceError::InvalidLiteral {
        raw: raw.to_string(),
        source,
    })
}
