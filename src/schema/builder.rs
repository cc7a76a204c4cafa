use std::fmt;
use std::sync::Arc;

use toml::Value;

use super::coerce::Kind;
use super::error::SchemaError;
use super::field::{Field, Transform};
use super::model::{Autoload, Schema};
use super::name::NameRule;
use super::resolve;
use super::source::{EnvSource, Source};

/// Schema-level options, each overridable per field.
struct Options {
    prefix: Option<String>,
    autoload: Autoload,
    source: Option<Arc<dyn Source>>,
    transform: Option<Transform>,
    wanted_kind: Kind,
    variable_rule: Option<NameRule>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prefix: None,
            autoload: Autoload::OnDefinition,
            source: None,
            transform: None,
            wanted_kind: Kind::Str,
            variable_rule: None,
        }
    }
}

/// Builder for declaring a configuration schema.
///
/// A schema is a named set of field declarations plus binding options.
/// Calling [`define`](Self::define) completes the declaration; with the
/// default [`Autoload::OnDefinition`] strategy the whole schema (including
/// nested schemas) is resolved before `define` returns.
///
/// ```
/// use std::sync::Arc;
/// use envbind::{Field, Kind, MapSource, Schema};
///
/// let source = Arc::new(MapSource::new());
/// source.set("APP_PORT", "8080");
/// source.set("APP_DEBUG", "yes");
///
/// let schema = Schema::builder("app")
///     .prefix("app")
///     .source(source)
///     .field(Field::new("port").kind(Kind::Int))
///     .field(Field::new("debug").kind(Kind::Bool))
///     .define()?;
///
/// assert_eq!(schema.get("port")?.as_integer(), Some(8080));
/// assert_eq!(schema.get("debug")?.as_bool(), Some(true));
/// # Ok::<(), envbind::SchemaError>(())
/// ```
#[must_use = "schema builders do nothing until .define() is called"]
pub struct SchemaBuilder {
    name: String,
    options: Options,
    fields: Vec<Field>,
    children: Vec<SchemaBuilder>,
}

impl SchemaBuilder {
    /// Starts a schema declaration with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::default(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Scopes derived variable names under a prefix segment.
    ///
    /// Nested schemas extend the enclosing chain with their own prefix;
    /// empty segments are dropped.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = Some(prefix.into());
        self
    }

    /// Chooses when, and onto what target, resolution runs.
    pub fn autoload(mut self, autoload: Autoload) -> Self {
        self.options.autoload = autoload;
        self
    }

    /// Sets the default source for fields without their own.
    ///
    /// Schemas that never set one read from a snapshot of the process
    /// environment captured when `define` runs.
    pub fn source(mut self, source: Arc<dyn Source>) -> Self {
        self.options.source = Some(source);
        self
    }

    /// Sets the default transform for fields without their own, replacing
    /// the coercion engine for them.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str, Kind) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        self.options.transform = Some(Arc::new(transform));
        self
    }

    /// Sets the target kind for fields that declare none. Defaults to
    /// [`Kind::Str`].
    pub fn wanted_kind(mut self, kind: Kind) -> Self {
        self.options.wanted_kind = kind;
        self
    }

    /// Replaces the default name-derivation rule for every field of this
    /// schema. Nested schemas inherit the rule unless they set their own.
    pub fn variable_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> String + Send + Sync + 'static,
    {
        self.options.variable_rule = Some(Arc::new(rule));
        self
    }

    /// Adds a field declaration.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a nested schema. It shares the enclosing prefix chain but none
    /// of the enclosing fields or other options.
    pub fn nested(mut self, child: SchemaBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Completes the declaration.
    ///
    /// Under [`Autoload::OnDefinition`] this runs the binding pass for the
    /// schema and every nested schema using the same strategy, so any
    /// missing variable or coercion failure surfaces here.
    pub fn define(self) -> Result<Schema, SchemaError> {
        let default_source: Arc<dyn Source> = Arc::new(EnvSource::snapshot());
        let mut schema = self.into_schema(&[], None, &default_source);
        if schema.autoload == Autoload::OnDefinition {
            let tree = resolve::resolve_schema(&schema)?;
            schema.commit(tree);
        }
        Ok(schema)
    }

    /// Converts the builder tree into a schema tree, fixing the prefix
    /// chain, the inherited name rule, and the effective source for every
    /// level.
    fn into_schema(
        self,
        ancestors: &[String],
        inherited_rule: Option<&NameRule>,
        default_source: &Arc<dyn Source>,
    ) -> Schema {
        let Options {
            prefix,
            autoload,
            source,
            transform,
            wanted_kind,
            variable_rule,
        } = self.options;

        let mut chain = ancestors.to_vec();
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            chain.push(prefix);
        }

        let rule = variable_rule.or_else(|| inherited_rule.cloned());
        let children = self
            .children
            .into_iter()
            .map(|child| child.into_schema(&chain, rule.as_ref(), default_source))
            .collect();

        Schema {
            name: self.name,
            autoload,
            chain,
            source: source.unwrap_or_else(|| Arc::clone(default_source)),
            transform,
            wanted_kind,
            variable_rule: rule,
            fields: self.fields,
            children,
            resolved: None,
        }
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .field("prefix", &self.options.prefix)
            .field("autoload", &self.options.autoload)
            .field("fields", &self.fields)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
