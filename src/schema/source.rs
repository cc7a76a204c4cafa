use std::collections::BTreeMap;
use std::sync::RwLock;

/// A string-keyed, string-valued lookup that configuration is read from.
///
/// The binder only ever reads. Implementations decide whether lookups see a
/// frozen snapshot ([`EnvSource`]) or live data ([`MapSource`]).
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Whether `key` is present in the source.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// A read-only snapshot of the process environment.
///
/// Captured once at construction; later changes to the environment are not
/// visible through it. Schemas that set no explicit source get one of these
/// when they are defined.
#[derive(Debug, Clone)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Captures the current process environment.
    pub fn snapshot() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }
}

impl Source for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// An in-memory source backed by a mutable map.
///
/// [`set`](Self::set) and [`remove`](Self::remove) take `&self`, so a
/// `MapSource` shared through an `Arc` can be updated between deferred
/// reloads or instance constructions and the next pass will observe the
/// change.
#[derive(Debug, Default)]
pub struct MapSource {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MapSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .expect("source map lock poisoned")
            .insert(key.into(), value.into());
    }

    /// Removes a value, if present.
    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .expect("source map lock poisoned")
            .remove(key);
    }
}

impl Source for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("source map lock poisoned")
            .get(key)
            .cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}
