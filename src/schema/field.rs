use std::fmt;
use std::sync::Arc;

use toml::Value;

use super::coerce::Kind;
use super::source::Source;

/// A custom transform replacing the coercion engine for a field.
///
/// Receives the raw source string and the effective kind, and returns the
/// final value. Its error is propagated as-is; no coercion runs afterwards.
pub type Transform =
    Arc<dyn Fn(&str, Kind) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// One configuration entry within a schema.
///
/// Carries the attribute identifier, the declared kind, and the optional
/// per-field resolution overrides. Field-level settings always take
/// precedence over their schema-level counterparts.
///
/// ```
/// use envbind::{Field, Kind};
///
/// let field = Field::new("debug")
///     .kind(Kind::Bool)
///     .default(false);
/// # let _ = field;
/// ```
#[derive(Clone)]
#[must_use = "fields do nothing until attached to a schema builder"]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: Option<Kind>,
    pub(crate) variable: Option<String>,
    pub(crate) default: Option<Value>,
    pub(crate) transform: Option<Transform>,
    pub(crate) source: Option<Arc<dyn Source>>,
}

impl Field {
    /// Declares a field with the given attribute identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            variable: None,
            default: None,
            transform: None,
            source: None,
        }
    }

    /// Declares the target kind. Untyped fields fall back to the schema's
    /// default wanted kind (`Str` unless overridden).
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the exact source-variable name, bypassing derivation entirely.
    /// No prefix is applied to an explicit name.
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.variable = Some(name.into());
        self
    }

    /// Sets the fallback used when the variable is absent from the source.
    ///
    /// Defaults are already-typed values and are used verbatim; they never
    /// pass through coercion or a transform.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Replaces the coercion engine for this field.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str, Kind) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Reads this field from the given source instead of the schema's.
    pub fn source(mut self, source: Arc<dyn Source>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("variable", &self.variable)
            .field("default", &self.default)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
