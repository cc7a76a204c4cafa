//! The binding pass: resolves every field of a schema tree against its
//! sources, producing a complete resolved tree that the caller commits to
//! the schema or to a fresh instance only on full success.

use toml::{Table, Value};

use super::coerce::coerce;
use super::error::SchemaError;
use super::field::Field;
use super::model::{Autoload, Schema};
use super::name;

/// The outcome of one pass: resolved values per schema, mirrored down the
/// nested-schema tree. Owning this separately from the schema is what makes
/// the pass all-or-nothing.
pub(crate) struct ResolvedTree {
    pub(crate) values: Table,
    pub(crate) children: Vec<(String, ResolvedTree)>,
}

/// Resolves a schema and, recursively, every nested schema that uses the
/// default `OnDefinition` strategy. Children that opted into `Never` or
/// `OnInstance` govern their own fields and are skipped here.
pub(crate) fn resolve_schema(schema: &Schema) -> Result<ResolvedTree, SchemaError> {
    let prefix = name::join_prefix(&schema.chain);

    let mut values = Table::new();
    for field in &schema.fields {
        let value = resolve_field(field, schema, prefix.as_deref())?;
        values.insert(field.name.clone(), value);
    }

    let mut children = Vec::new();
    for child in &schema.children {
        if child.autoload == Autoload::OnDefinition {
            children.push((child.name.clone(), resolve_schema(child)?));
        }
    }

    Ok(ResolvedTree { values, children })
}

/// Resolves one field with its effective options: field-level settings win
/// over schema-level ones, which win over the global defaults.
fn resolve_field(
    field: &Field,
    schema: &Schema,
    prefix: Option<&str>,
) -> Result<Value, SchemaError> {
    let variable = match &field.variable {
        Some(explicit) => explicit.clone(),
        None => match &schema.variable_rule {
            Some(rule) => rule(&field.name, prefix),
            None => name::variable_name(&field.name, prefix),
        },
    };

    let source = field.source.as_ref().unwrap_or(&schema.source);
    let Some(raw) = source.get(&variable) else {
        // Defaults are already typed and are used verbatim.
        return match &field.default {
            Some(value) => Ok(value.clone()),
            None => Err(SchemaError::MissingVariable(variable)),
        };
    };

    let kind = field.kind.unwrap_or(schema.wanted_kind);
    match field.transform.as_ref().or(schema.transform.as_ref()) {
        Some(transform) => {
            transform(&raw, kind).map_err(|cause| SchemaError::Transform {
                variable,
                source: cause,
            })
        }
        None => coerce(&raw, kind).map_err(|cause| SchemaError::Coerce {
            variable,
            source: cause,
        }),
    }
}
