pub mod schema;

pub use schema::{
    coerce, variable_name, Autoload, CoerceError, EnvSource, Field, Instance, Kind, LiteralError,
    MapSource, NameRule, Schema, SchemaBuilder, SchemaError, Source, Transform,
};
pub use toml::{Table, Value};
