use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::builder::SchemaBuilder;
use super::coerce::Kind;
use super::error::SchemaError;
use super::field::{Field, Transform};
use super::name::NameRule;
use super::resolve::{self, ResolvedTree};
use super::source::Source;

/// When, and onto what target, a schema's fields are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Autoload {
    /// Resolve synchronously while `define()` runs; values live on the
    /// schema. The default. Re-triggering is not exposed.
    #[default]
    OnDefinition,
    /// Stay unresolved until [`Schema::load`] is called explicitly; each
    /// call re-reads the source and overwrites prior values.
    Never,
    /// Resolve once per [`Schema::instantiate`] call; values live on the
    /// returned [`Instance`] and the schema itself never resolves.
    OnInstance,
}

/// A defined configuration schema: a named set of fields plus binding
/// options, possibly with nested child schemas.
///
/// Immutable after definition except for the resolved values it holds.
/// Reading a field before its governing resolution pass has run is an
/// error, never a silent default.
pub struct Schema {
    pub(crate) name: String,
    pub(crate) autoload: Autoload,
    /// Prefix chain including this schema's own prefix; empty segments are
    /// dropped at construction.
    pub(crate) chain: Vec<String>,
    pub(crate) source: Arc<dyn Source>,
    pub(crate) transform: Option<Transform>,
    pub(crate) wanted_kind: Kind,
    pub(crate) variable_rule: Option<NameRule>,
    pub(crate) fields: Vec<Field>,
    pub(crate) children: Vec<Schema>,
    pub(crate) resolved: Option<Table>,
}

impl Schema {
    /// Starts a schema declaration.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The schema's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema's autoload strategy.
    pub fn autoload(&self) -> Autoload {
        self.autoload
    }

    /// Whether a resolution pass has committed values to this schema.
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Returns the resolved value of a field.
    ///
    /// Fails with [`SchemaError::PrematureAccess`] when the governing pass
    /// has not run: before [`load`](Self::load) under [`Autoload::Never`],
    /// and always at schema level under [`Autoload::OnInstance`].
    pub fn get(&self, field: &str) -> Result<&Value, SchemaError> {
        if !self.fields.iter().any(|f| f.name == field) {
            return Err(SchemaError::UnknownField {
                schema: self.name.clone(),
                field: field.to_string(),
            });
        }
        match &self.resolved {
            Some(values) => values.get(field).ok_or_else(|| SchemaError::PrematureAccess {
                schema: self.name.clone(),
                field: field.to_string(),
            }),
            None => Err(SchemaError::PrematureAccess {
                schema: self.name.clone(),
                field: field.to_string(),
            }),
        }
    }

    /// Returns a nested schema by name.
    pub fn child(&self, name: &str) -> Result<&Schema, SchemaError> {
        self.children
            .iter()
            .find(|child| child.name == name)
            .ok_or_else(|| SchemaError::UnknownChild {
                schema: self.name.clone(),
                child: name.to_string(),
            })
    }

    /// Returns a nested schema by name, mutably. Needed to trigger a
    /// deferred child's own [`load`](Self::load).
    pub fn child_mut(&mut self, name: &str) -> Result<&mut Schema, SchemaError> {
        match self.children.iter().position(|child| child.name == name) {
            Some(index) => Ok(&mut self.children[index]),
            None => Err(SchemaError::UnknownChild {
                schema: self.name.clone(),
                child: name.to_string(),
            }),
        }
    }

    /// Runs (or re-runs) the binding pass for a deferred schema.
    ///
    /// Only meaningful under [`Autoload::Never`]; other strategies refuse.
    /// Each call re-reads the source mapping from scratch and overwrites
    /// previously resolved values. On failure nothing is committed and any
    /// values from an earlier successful pass remain intact.
    pub fn load(&mut self) -> Result<(), SchemaError> {
        if self.autoload != Autoload::Never {
            return Err(SchemaError::NotDeferred {
                schema: self.name.clone(),
            });
        }
        let tree = resolve::resolve_schema(self)?;
        self.commit(tree);
        Ok(())
    }

    /// Runs a binding pass scoped to a fresh [`Instance`].
    ///
    /// Only meaningful under [`Autoload::OnInstance`]. Instances are
    /// independent: each construction re-reads the source, so two instances
    /// may observe different values if the source changed in between.
    pub fn instantiate(&self) -> Result<Instance, SchemaError> {
        if self.autoload != Autoload::OnInstance {
            return Err(SchemaError::NotInstanceScoped {
                schema: self.name.clone(),
            });
        }
        let tree = resolve::resolve_schema(self)?;
        Ok(Instance::from_tree(self.name.clone(), tree))
    }

    /// Deserializes the resolved schema (nested schemas become nested
    /// tables keyed by their name) into a typed settings struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        Value::Table(self.assemble()?)
            .try_into()
            .map_err(SchemaError::Deserialize)
    }

    fn assemble(&self) -> Result<Table, SchemaError> {
        let mut table = self
            .resolved
            .clone()
            .ok_or_else(|| SchemaError::UnresolvedSchema {
                schema: self.name.clone(),
            })?;
        for child in &self.children {
            table.insert(child.name.clone(), Value::Table(child.assemble()?));
        }
        Ok(table)
    }

    pub(crate) fn commit(&mut self, tree: ResolvedTree) {
        self.resolved = Some(tree.values);
        for (name, child_tree) in tree.children {
            if let Some(child) = self.children.iter_mut().find(|c| c.name == name) {
                child.commit(child_tree);
            }
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("autoload", &self.autoload)
            .field("chain", &self.chain)
            .field("source", &self.source)
            .field("fields", &self.fields)
            .field("children", &self.children)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

/// Resolved values scoped to one construction of an instance-scoped schema.
#[derive(Debug)]
pub struct Instance {
    schema: String,
    values: Table,
    children: Vec<(String, Instance)>,
}

impl Instance {
    fn from_tree(schema: String, tree: ResolvedTree) -> Self {
        let children = tree
            .children
            .into_iter()
            .map(|(name, child_tree)| {
                let child = Instance::from_tree(name.clone(), child_tree);
                (name, child)
            })
            .collect();
        Self {
            schema,
            values: tree.values,
            children,
        }
    }

    /// Returns the resolved value of a field on this instance.
    pub fn get(&self, field: &str) -> Result<&Value, SchemaError> {
        self.values
            .get(field)
            .ok_or_else(|| SchemaError::UnknownField {
                schema: self.schema.clone(),
                field: field.to_string(),
            })
    }

    /// Returns a nested instance by schema name.
    pub fn child(&self, name: &str) -> Result<&Instance, SchemaError> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, instance)| instance)
            .ok_or_else(|| SchemaError::UnknownChild {
                schema: self.schema.clone(),
                child: name.to_string(),
            })
    }

    /// Deserializes the instance's resolved values into a typed settings
    /// struct, nested schemas included.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        Value::Table(self.assemble())
            .try_into()
            .map_err(SchemaError::Deserialize)
    }

    fn assemble(&self) -> Table {
        let mut table = self.values.clone();
        for (name, child) in &self.children {
            table.insert(name.clone(), Value::Table(child.assemble()));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;

    use crate::schema::{Autoload, Field, Kind, MapSource, Schema, SchemaError};

    fn source_of(pairs: &[(&str, &str)]) -> Arc<MapSource> {
        Arc::new(pairs.iter().copied().collect())
    }

    #[test]
    fn test_deferred_schema_stays_unresolved_until_loaded() {
        let source = source_of(&[("A", "a"), ("B", "True")]);

        let mut schema = Schema::builder("settings")
            .autoload(Autoload::Never)
            .source(source)
            .field(Field::new("a"))
            .field(Field::new("b").kind(Kind::Bool).default(false))
            .define()
            .unwrap();

        assert!(!schema.is_resolved());
        assert!(matches!(
            schema.get("a"),
            Err(SchemaError::PrematureAccess { field, .. }) if field == "a"
        ));

        schema.load().unwrap();
        assert_eq!(schema.get("a").unwrap().as_str(), Some("a"));
        assert_eq!(schema.get("b").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_reloading_observes_source_changes() {
        let source = source_of(&[("VALUE", "first")]);

        let mut schema = Schema::builder("settings")
            .autoload(Autoload::Never)
            .source(source.clone())
            .field(Field::new("value"))
            .define()
            .unwrap();

        schema.load().unwrap();
        assert_eq!(schema.get("value").unwrap().as_str(), Some("first"));

        source.set("VALUE", "second");
        schema.load().unwrap();
        assert_eq!(schema.get("value").unwrap().as_str(), Some("second"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_values() {
        let source = source_of(&[("VALUE", "kept")]);

        let mut schema = Schema::builder("settings")
            .autoload(Autoload::Never)
            .source(source.clone())
            .field(Field::new("value"))
            .define()
            .unwrap();

        schema.load().unwrap();
        source.remove("VALUE");

        assert!(matches!(schema.load(), Err(SchemaError::MissingVariable(_))));
        assert_eq!(schema.get("value").unwrap().as_str(), Some("kept"));
    }

    #[test]
    fn test_reload_is_idempotent_against_an_unchanged_source() {
        let source = source_of(&[("LIST", "[1, 2, 3]"), ("FLAG", "yes")]);

        let mut schema = Schema::builder("settings")
            .autoload(Autoload::Never)
            .source(source)
            .field(Field::new("list").kind(Kind::List))
            .field(Field::new("flag").kind(Kind::Bool))
            .define()
            .unwrap();

        schema.load().unwrap();
        let first_list = schema.get("list").unwrap().clone();
        let first_flag = schema.get("flag").unwrap().clone();

        schema.load().unwrap();
        assert_eq!(schema.get("list").unwrap(), &first_list);
        assert_eq!(schema.get("flag").unwrap(), &first_flag);
    }

    #[test]
    fn test_load_refuses_non_deferred_schemas() {
        let source = source_of(&[("A", "a")]);

        let mut schema = Schema::builder("settings")
            .source(source)
            .field(Field::new("a"))
            .define()
            .unwrap();

        assert!(matches!(schema.load(), Err(SchemaError::NotDeferred { .. })));
    }

    #[test]
    fn test_instances_resolve_independently() {
        let source = source_of(&[("VALUE", "first")]);

        let schema = Schema::builder("settings")
            .autoload(Autoload::OnInstance)
            .source(source.clone())
            .field(Field::new("value"))
            .define()
            .unwrap();

        let first = schema.instantiate().unwrap();
        source.set("VALUE", "second");
        let second = schema.instantiate().unwrap();

        assert_eq!(first.get("value").unwrap().as_str(), Some("first"));
        assert_eq!(second.get("value").unwrap().as_str(), Some("second"));
    }

    #[test]
    fn test_schema_level_access_is_premature_under_on_instance() {
        let source = source_of(&[("VALUE", "v")]);

        let schema = Schema::builder("settings")
            .autoload(Autoload::OnInstance)
            .source(source)
            .field(Field::new("value"))
            .define()
            .unwrap();

        let _instance = schema.instantiate().unwrap();
        assert!(matches!(
            schema.get("value"),
            Err(SchemaError::PrematureAccess { .. })
        ));
    }

    #[test]
    fn test_instantiate_refuses_other_strategies() {
        let source = source_of(&[("A", "a")]);

        let schema = Schema::builder("settings")
            .source(source)
            .field(Field::new("a"))
            .define()
            .unwrap();

        assert!(matches!(
            schema.instantiate(),
            Err(SchemaError::NotInstanceScoped { .. })
        ));
    }

    #[test]
    fn test_instance_carries_nested_schemas() {
        let source = source_of(&[("INTEGER", "42"), ("NESTED_BOOLEAN", "no")]);

        let schema = Schema::builder("outer")
            .autoload(Autoload::OnInstance)
            .source(source.clone())
            .field(Field::new("integer").kind(Kind::Int))
            .nested(
                Schema::builder("nested")
                    .prefix("nested")
                    .source(source)
                    .field(Field::new("boolean").kind(Kind::Bool)),
            )
            .define()
            .unwrap();

        let instance = schema.instantiate().unwrap();
        assert_eq!(instance.get("integer").unwrap().as_integer(), Some(42));
        assert_eq!(
            instance.child("nested").unwrap().get("boolean").unwrap().as_bool(),
            Some(false)
        );
    }

    #[test]
    fn test_deferred_nested_child_is_skipped_by_the_parent_pass() {
        let source = source_of(&[("READY", "yes")]);

        let mut schema = Schema::builder("outer")
            .source(source.clone())
            .field(Field::new("ready").kind(Kind::Bool))
            .nested(
                Schema::builder("later")
                    .prefix("later")
                    .autoload(Autoload::Never)
                    .source(source.clone())
                    .field(Field::new("value")),
            )
            .define()
            .unwrap();

        assert_eq!(schema.get("ready").unwrap().as_bool(), Some(true));
        assert!(!schema.child("later").unwrap().is_resolved());

        source.set("LATER_VALUE", "now");
        schema.child_mut("later").unwrap().load().unwrap();
        assert_eq!(
            schema.child("later").unwrap().get("value").unwrap().as_str(),
            Some("now")
        );
    }

    #[test]
    fn test_unknown_field_and_child_errors() {
        let source = source_of(&[("A", "a")]);

        let schema = Schema::builder("settings")
            .source(source)
            .field(Field::new("a"))
            .define()
            .unwrap();

        assert!(matches!(
            schema.get("missing"),
            Err(SchemaError::UnknownField { field, .. }) if field == "missing"
        ));
        assert!(matches!(
            schema.child("missing"),
            Err(SchemaError::UnknownChild { child, .. }) if child == "missing"
        ));
    }

    #[derive(Debug, Deserialize)]
    struct Settings {
        port: i64,
        debug: bool,
        database: Database,
    }

    #[derive(Debug, Deserialize)]
    struct Database {
        host: String,
    }

    #[test]
    fn test_deserialize_into_a_typed_struct() {
        let source = source_of(&[
            ("PORT", "8080"),
            ("DEBUG", "no"),
            ("DATABASE_HOST", "db.local"),
        ]);

        let schema = Schema::builder("settings")
            .source(source.clone())
            .field(Field::new("port").kind(Kind::Int))
            .field(Field::new("debug").kind(Kind::Bool))
            .nested(
                Schema::builder("database")
                    .prefix("database")
                    .source(source)
                    .field(Field::new("host")),
            )
            .define()
            .unwrap();

        let settings: Settings = schema.deserialize().unwrap();
        assert_eq!(settings.port, 8080);
        assert!(!settings.debug);
        assert_eq!(settings.database.host, "db.local");
    }

    #[test]
    fn test_deserialize_requires_resolution() {
        let source = source_of(&[("PORT", "1")]);

        let schema = Schema::builder("settings")
            .autoload(Autoload::Never)
            .source(source)
            .field(Field::new("port").kind(Kind::Int))
            .define()
            .unwrap();

        #[derive(Debug, Deserialize)]
        struct Bare {
            #[allow(dead_code)]
            port: i64,
        }

        assert!(matches!(
            schema.deserialize::<Bare>(),
            Err(SchemaError::UnresolvedSchema { .. })
        ));
    }
}
