use std::sync::Arc;

use envbind::{Field, Kind, MapSource, Schema};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Settings {
    name: String,
    port: i64,
    debug: bool,
    tags: Vec<String>,
    database: Database,
}

#[derive(Debug, Deserialize)]
struct Database {
    host: String,
    pool_size: i64,
}

fn main() -> Result<(), envbind::SchemaError> {
    // Stands in for the process environment; a schema without an explicit
    // source reads a snapshot of std::env::vars() instead.
    let source = Arc::new(MapSource::new());
    source.set("APP_NAME", "demo");
    source.set("APP_PORT", "8080");
    source.set("APP_DEBUG", "yes");
    source.set("APP_TAGS", "['alpha', 'beta']");
    source.set("APP_DATABASE_HOST", "db.local");

    let schema = Schema::builder("app")
        .prefix("app")
        .source(source.clone())
        .field(Field::new("name"))
        .field(Field::new("port").kind(Kind::Int))
        .field(Field::new("debug").kind(Kind::Bool))
        .field(Field::new("tags").kind(Kind::List))
        .nested(
            Schema::builder("database")
                .prefix("database")
                .source(source)
                .field(Field::new("host"))
                .field(Field::new("pool_size").kind(Kind::Int).default(10i64)),
        )
        .define()?;

    // Field-by-field access...
    println!("port = {}", schema.get("port")?);

    // ...or the whole schema at once.
    let settings: Settings = schema.deserialize()?;
    println!("{settings:#?}");

    Ok(())
}
