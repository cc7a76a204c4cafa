use thiserror::Error;

use super::coerce::CoerceError;

/// Errors surfaced while defining, resolving, or reading a schema.
///
/// Resolution is all-or-nothing per pass: the first failing field aborts the
/// pass for the whole schema (including nested schemas resolved in the same
/// pass) and nothing is committed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("required variable {0:?} is not set")]
    MissingVariable(String),

    #[error("invalid value for {variable:?}: {source}")]
    Coerce {
        variable: String,
        #[source]
        source: CoerceError,
    },

    #[error("transform failed for {variable:?}: {source}")]
    Transform {
        variable: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("field {field:?} of schema {schema:?} has not been resolved yet")]
    PrematureAccess { schema: String, field: String },

    #[error("schema {schema:?} has not been resolved yet")]
    UnresolvedSchema { schema: String },

    #[error("schema {schema:?} has no field {field:?}")]
    UnknownField { schema: String, field: String },

    #[error("schema {schema:?} has no nested schema {child:?}")]
    UnknownChild { schema: String, child: String },

    #[error("schema {schema:?} does not use deferred loading")]
    NotDeferred { schema: String },

    #[error("schema {schema:?} is not instance-scoped")]
    NotInstanceScoped { schema: String },

    #[error("failed to deserialize resolved configuration: {0}")]
    Deserialize(#[from] toml::de::Error),
}
