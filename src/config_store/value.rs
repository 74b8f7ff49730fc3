use std::{collections::BTreeMap, fmt, path::Path};

use serde::de::DeserializeOwned;

use super::ConfigError;

/// A mapping level of the configuration tree.
pub type Mapping = BTreeMap<String, Value>;

/// A node of the in-memory configuration tree.
///
/// Scalars are stored flat; nested documents are `Mapping`s of string keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit YAML null (`~`, `null` or an empty value)
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Signed integer scalar
    Integer(i64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    String(String),
    /// Ordered sequence of values
    Sequence(Vec<Value>),
    /// Nested mapping
    Mapping(Mapping),
}

impl Value {
    /// Creates an empty mapping, the tree of an empty document.
    pub fn empty_mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    /// Returns the inner string if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner integer if this is an integer scalar.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the inner float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the inner boolean if this is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the sequence items if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping if this is a mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in logs and error messages.
    pub fn type_str(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Deserializes this value into a concrete type.
    ///
    /// # Errors
    /// Returns `ConfigError::TypeMismatch` if the value does not fit `T`.
    pub fn deserialize_into<T>(&self, path: &ConfigPath) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        serde_yaml::from_value(serde_yaml::Value::from(self.clone())).map_err(|e| {
            ConfigError::TypeMismatch {
                path: path.to_string(),
                expected_type: std::any::type_name::<T>(),
                details: e.to_string(),
            }
        })
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Yaml::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, value)| (mapping_key(key), Value::from(value)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

impl From<Value> for serde_yaml::Value {
    fn from(value: Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Value::Null => Yaml::Null,
            Value::Bool(b) => Yaml::Bool(b),
            Value::Integer(i) => Yaml::Number(i.into()),
            Value::Float(f) => Yaml::Number(f.into()),
            Value::String(s) => Yaml::String(s),
            Value::Sequence(items) => Yaml::Sequence(items.into_iter().map(Yaml::from).collect()),
            Value::Mapping(map) => Yaml::Mapping(
                map.into_iter()
                    .map(|(key, value)| (Yaml::String(key), Yaml::from(value)))
                    .collect(),
            ),
        }
    }
}

fn mapping_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Null => "~".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Tagged(tagged) => mapping_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Ordered sequence of keys locating a node in the tree.
///
/// A bare string is a single key; it is never split on dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    /// Builds a path from its keys.
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    /// The keys of this path, outermost first.
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Whether the path has no keys (addresses the root).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a new path with `key` appended.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for ConfigPath {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for ConfigPath {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<&[&str]> for ConfigPath {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ConfigPath {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<Vec<&str>> for ConfigPath {
    fn from(keys: Vec<&str>) -> Self {
        Self(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ConfigPath {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

impl From<&ConfigPath> for ConfigPath {
    fn from(path: &ConfigPath) -> Self {
        path.clone()
    }
}

/// Parses a YAML document into a configuration tree.
///
/// An empty or comment-only document yields an empty mapping. Any other
/// valid YAML value is accepted as the tree, including non-mapping roots.
///
/// # Errors
/// Returns `ConfigError::Parse` if the text is not valid YAML.
pub fn parse_document(text: &str, source: &Path) -> Result<Value, ConfigError> {
    if text.trim().is_empty() {
        return Ok(Value::empty_mapping());
    }

    let parsed: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| ConfigError::parse(e, source))?;

    match Value::from(parsed) {
        Value::Null => Ok(Value::empty_mapping()),
        tree => Ok(tree),
    }
}

/// Reads and parses the document at `path`.
///
/// # Errors
/// Returns `ConfigError::Io` if the file cannot be read and
/// `ConfigError::Parse` if its contents are not valid YAML.
pub fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(e, path))?;
    parse_document(&text, path)
}
