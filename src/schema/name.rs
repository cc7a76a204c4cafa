use std::sync::Arc;

/// A custom variable-name derivation rule.
///
/// Receives the attribute identifier and the joined prefix chain (if any) and
/// returns the source-variable name. A schema-level rule replaces
/// [`variable_name`] for every field of that schema and is inherited by
/// nested schemas unless they set their own.
pub type NameRule = Arc<dyn Fn(&str, Option<&str>) -> String + Send + Sync>;

/// Derives the source-variable name for an attribute.
///
/// Uppercases the attribute identifier, joining it to the prefix with an
/// underscore when one is given:
///
/// ```
/// use envbind::variable_name;
///
/// assert_eq!(variable_name("attr_name", Some("prefixed")), "PREFIXED_ATTR_NAME");
/// assert_eq!(variable_name("attr_name", None), "ATTR_NAME");
/// ```
pub fn variable_name(attribute: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}_{attribute}").to_uppercase(),
        _ => attribute.to_uppercase(),
    }
}

/// Joins a prefix chain into the single prefix handed to derivation.
///
/// Empty segments are dropped so they cannot produce doubled separators.
pub(crate) fn join_prefix(chain: &[String]) -> Option<String> {
    let segments: Vec<&str> = chain
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(String::as_str)
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("_"))
    }
}
