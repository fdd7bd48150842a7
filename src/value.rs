//! The scope-value representation threaded through compiled templates.
//!
//! The core never hard-codes a single host data type. A [`Value`] tree is
//! the crate's native representation, and [`DefaultPropertyResolver`] knows
//! how to walk it; hosts bridging their own structs, maps, or dynamic
//! objects provide their own [`PropertyResolver`] instead.

use std::collections::HashMap;
use std::fmt;

/// A value on the scope stack: null, a scalar, an ordered sequence, or an
/// object with named properties.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<Value>),
    Object(HashMap<String, Value>),
}

impl Value {
    /// Builds an object value from `(key, value)` pairs.
    pub fn object(fields: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// `false`, null, and empty sequences are falsy. Everything else,
    /// including empty strings and empty objects, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Sequence(items) => !items.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "[object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Injected capability: resolves a named property on a
/// scope value, returning either the child value or a miss.
///
/// Hosts bridging foreign types (structs, maps, dynamic objects from a
/// scripting runtime) provide their own impl; [`DefaultPropertyResolver`]
/// covers the crate's own [`Value`] representation.
pub trait PropertyResolver: Send + Sync {
    fn resolve<'a>(&self, scope: &'a Value, name: &str) -> Option<&'a Value>;
}

/// The property resolver used when a caller doesn't supply its own: looks
/// up `name` on `Value::Object` scopes and misses on everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPropertyResolver;

impl PropertyResolver for DefaultPropertyResolver {
    fn resolve<'a>(&self, scope: &'a Value, name: &str) -> Option<&'a Value> {
        match scope {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }
}

/// Injected capability: renders a value under a host format
/// specifier (date/number formatting, locale-aware display, ...). The core
/// never implements formatting itself, `None` means the provider doesn't
/// recognize the specifier.
pub trait FormatProvider: Send + Sync {
    fn format(&self, value: &Value, format: &str) -> Option<String>;
}
