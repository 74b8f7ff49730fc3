use tracing::debug;

use super::{ConfigError, ConfigPath, Mapping, Value};

/// Checks if a configuration path matches a subscription pattern
///
/// # Arguments
/// * `path` - The actual configuration path
/// * `pattern` - Dot-separated pattern to match against (supports "*" as a segment wildcard)
///
/// # Examples
/// * `["server", "port"]` matches `"server.port"`
/// * `["server", "port"]` matches `"server.*"`
/// * `["server", "port"]` matches `"server"`
/// * `["server", "port"]` matches `"*"`
pub(super) fn path_matches(path: &ConfigPath, pattern: &str) -> bool {
    const WILDCARD: &str = "*";

    if pattern == WILDCARD {
        return true;
    };

    let pattern_parts: Vec<&str> = pattern.split('.').collect();

    if pattern_parts.len() > path.len() {
        return false;
    }

    path.keys()
        .iter()
        .zip(pattern_parts.iter())
        .all(|(key, pattern_part)| *pattern_part == WILDCARD || key == pattern_part)
}

/// Resolves a path against a configuration tree
///
/// Walks the keys left to right, requiring a mapping at every step. A key that
/// is missing, a step into a non-mapping value, or an explicit null at the leaf
/// all resolve to `None`. The empty path resolves to the root.
pub fn resolve<'a>(tree: &'a Value, path: &ConfigPath) -> Option<&'a Value> {
    let mut current = tree;

    for key in path.keys() {
        current = match current {
            Value::Mapping(map) => map.get(key)?,
            _ => return None,
        };
    }

    if current.is_null() { None } else { Some(current) }
}

/// Sets a value at the specified path, creating intermediate mappings
///
/// Missing intermediate keys get empty mappings. An intermediate value that is
/// not a mapping (including the root) is replaced by one, so the assigned value
/// is always reachable afterwards.
///
/// # Arguments
/// * `tree` - The root value to modify
/// * `path` - Keys leading to the target location
/// * `new_value` - The value to store at the leaf
///
/// # Errors
/// * `ConfigError::EmptyPath` - If the path has no keys
pub fn assign(tree: &mut Value, path: &ConfigPath, new_value: Value) -> Result<(), ConfigError> {
    let Some((last_key, parents)) = path.keys().split_last() else {
        return Err(ConfigError::EmptyPath);
    };

    let mut current = ensure_mapping(tree, "");

    for key in parents {
        let child = current
            .entry(key.clone())
            .or_insert_with(Value::empty_mapping);
        current = ensure_mapping(child, key);
    }

    current.insert(last_key.clone(), new_value);

    Ok(())
}

/// Returns the mapping behind `value`, replacing any non-mapping value first
fn ensure_mapping<'a>(value: &'a mut Value, key: &str) -> &'a mut Mapping {
    if !matches!(value, Value::Mapping(_)) {
        debug!(key, replaced = value.type_str(), "replacing non-mapping node on assign");
        *value = Value::empty_mapping();
    }

    match value {
        Value::Mapping(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}
