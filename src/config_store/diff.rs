use std::{collections::BTreeSet, time::Instant};

use super::{ChangeSource, ConfigChange, ConfigPath, Value};

/// Compares two configuration trees and identifies field-level changes.
///
/// Mappings are compared key by key and recursed into; any other pair of
/// differing values (scalars, sequences, or a type change) is reported as a
/// single change at that path. Removed keys carry `new_value: None`.
pub fn diff_trees(old: &Value, new: &Value, source: ChangeSource) -> Vec<ConfigChange> {
    let mut changes = Vec::new();
    diff_values(&ConfigPath::default(), old, new, source, Instant::now(), &mut changes);
    changes
}

fn diff_values(
    path: &ConfigPath,
    old: &Value,
    new: &Value,
    source: ChangeSource,
    timestamp: Instant,
    changes: &mut Vec<ConfigChange>,
) {
    match (old, new) {
        (Value::Mapping(old_map), Value::Mapping(new_map)) => {
            let all_keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();

            for key in all_keys {
                let field_path = path.child(key.as_str());

                match (old_map.get(key), new_map.get(key)) {
                    (Some(old_val), Some(new_val)) => {
                        diff_values(&field_path, old_val, new_val, source, timestamp, changes);
                    }
                    (old_val, new_val) => changes.push(ConfigChange {
                        path: field_path,
                        old_value: old_val.cloned(),
                        new_value: new_val.cloned(),
                        source,
                        timestamp,
                    }),
                }
            }
        }
        _ => {
            if old != new {
                changes.push(ConfigChange {
                    path: path.clone(),
                    old_value: Some(old.clone()),
                    new_value: Some(new.clone()),
                    source,
                    timestamp,
                });
            }
        }
    }
}
