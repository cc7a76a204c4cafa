//! Typed configuration schemas bound from string-keyed sources.

mod builder;
mod coerce;
mod error;
mod field;
mod literal;
mod model;
mod name;
mod resolve;
mod source;

pub use builder::SchemaBuilder;
pub use coerce::{coerce, CoerceError, Kind};
pub use error::SchemaError;
pub use field::{Field, Transform};
pub use literal::LiteralError;
pub use model::{Autoload, Instance, Schema};
pub use name::{variable_name, NameRule};
pub use source::{EnvSource, MapSource, Source};
