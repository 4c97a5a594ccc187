//! Attribute values and declared attribute types.
//!
//! # Responsibility
//! - Represent every value an instance attribute can hold.
//! - Coerce incoming values to the declared type of a known attribute.
//!
//! # Invariants
//! - JSON encoding is untagged; a value round-trips through the persisted
//!   file without changing variant (integers stay integers, floats stay
//!   floats).
//! - Coercion never panics; failures are returned as `FieldDiagnostic`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Dynamically typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Returns the string payload when this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Renders the value as plain text, without quoting strings.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Console representation: strings quoted, containers bracketed.
impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Str(value) => write_quoted(f, value),
            Self::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Writes a single-quoted, backslash-escaped string.
pub(crate) fn write_quoted(f: &mut Formatter<'_>, value: &str) -> std::fmt::Result {
    write!(f, "'")?;
    for c in value.chars() {
        match c {
            '\'' => write!(f, "\\'")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            other => write!(f, "{other}")?,
        }
    }
    write!(f, "'")
}

/// Declared type of a known attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Str,
    Int,
    Float,
    List,
}

impl AttrType {
    /// Returns the type-level default value.
    pub fn default_value(self) -> AttrValue {
        match self {
            Self::Str => AttrValue::Str(String::new()),
            Self::Int => AttrValue::Int(0),
            Self::Float => AttrValue::Float(0.0),
            Self::List => AttrValue::List(Vec::new()),
        }
    }

    /// Type label as written in declarations and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::List => "list",
        }
    }

    /// Converts `value` to this declared type.
    ///
    /// # Errors
    /// - Returns a diagnostic reason when the value has no sensible
    ///   conversion (e.g. `"abc"` to `int`, a map to `float`).
    pub fn coerce(self, value: AttrValue) -> Result<AttrValue, String> {
        match (self, value) {
            (Self::Str, AttrValue::Str(text)) => Ok(AttrValue::Str(text)),
            (Self::Str, other) => Ok(AttrValue::Str(other.to_string())),

            (Self::Int, AttrValue::Int(number)) => Ok(AttrValue::Int(number)),
            (Self::Int, AttrValue::Bool(flag)) => Ok(AttrValue::Int(i64::from(flag))),
            (Self::Int, AttrValue::Float(number)) => float_to_int(number)
                .map(AttrValue::Int)
                .ok_or_else(|| format!("{number:?} is out of int range")),
            (Self::Int, AttrValue::Str(text)) => text
                .trim()
                .parse::<i64>()
                .map(AttrValue::Int)
                .map_err(|_| format!("expected int, got '{text}'")),
            (Self::Int, other) => Err(format!("expected int, got {}", other.type_name())),

            (Self::Float, AttrValue::Float(number)) => Ok(AttrValue::Float(number)),
            (Self::Float, AttrValue::Int(number)) => Ok(AttrValue::Float(number as f64)),
            (Self::Float, AttrValue::Bool(flag)) => {
                Ok(AttrValue::Float(if flag { 1.0 } else { 0.0 }))
            }
            (Self::Float, AttrValue::Str(text)) => text
                .trim()
                .parse::<f64>()
                .map(AttrValue::Float)
                .map_err(|_| format!("expected float, got '{text}'")),
            (Self::Float, other) => Err(format!("expected float, got {}", other.type_name())),

            (Self::List, AttrValue::List(items)) => Ok(AttrValue::List(items)),
            (Self::List, AttrValue::Str(text)) => {
                match super::literal::parse_literal(&text) {
                    Ok(AttrValue::List(items)) => Ok(AttrValue::List(items)),
                    _ => Err(format!("expected list, got '{text}'")),
                }
            }
            (Self::List, other) => Err(format!("expected list, got {}", other.type_name())),
        }
    }
}

/// Truncates toward zero; `None` when the result does not fit in `i64`.
fn float_to_int(number: f64) -> Option<i64> {
    let truncated = number.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// One rejected `name=value` pair and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiagnostic {
    pub name: String,
    pub reason: String,
}

impl FieldDiagnostic {
    /// Builds a diagnostic for attribute `name`.
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl Display for FieldDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttrType, AttrValue};
    use std::collections::BTreeMap;

    #[test]
    fn display_uses_console_literal_forms() {
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), AttrValue::Int(1));
        let value = AttrValue::List(vec![
            AttrValue::Str("a".to_string()),
            AttrValue::Float(2.0),
            AttrValue::Bool(true),
            AttrValue::None,
            AttrValue::Map(map),
        ]);
        assert_eq!(value.to_string(), "['a', 2.0, True, None, {'k': 1}]");
    }

    #[test]
    fn display_escapes_apostrophes() {
        assert_eq!(AttrValue::from("it's").to_string(), r"'it\'s'");
    }

    #[test]
    fn coerce_int_from_string_and_float() {
        assert_eq!(
            AttrType::Int.coerce(AttrValue::from("42")),
            Ok(AttrValue::Int(42))
        );
        assert_eq!(
            AttrType::Int.coerce(AttrValue::Float(3.9)),
            Ok(AttrValue::Int(3))
        );
        assert!(AttrType::Int.coerce(AttrValue::from("abc")).is_err());
    }

    #[test]
    fn coerce_int_rejects_out_of_range_floats() {
        assert!(AttrType::Int.coerce(AttrValue::Float(1e30)).is_err());
        assert!(AttrType::Int.coerce(AttrValue::Float(-1e30)).is_err());
        assert!(AttrType::Int.coerce(AttrValue::Float(f64::NAN)).is_err());
        assert_eq!(
            AttrType::Int.coerce(AttrValue::Float(-2.7)),
            Ok(AttrValue::Int(-2))
        );
    }

    #[test]
    fn coerce_float_and_str() {
        assert_eq!(
            AttrType::Float.coerce(AttrValue::Int(7)),
            Ok(AttrValue::Float(7.0))
        );
        assert_eq!(
            AttrType::Str.coerce(AttrValue::Int(7)),
            Ok(AttrValue::from("7"))
        );
    }

    #[test]
    fn coerce_str_renders_containers_in_console_form() {
        assert_eq!(
            AttrType::Str.coerce(AttrValue::List(vec![AttrValue::from("a")])),
            Ok(AttrValue::from("['a']"))
        );
        assert_eq!(
            AttrType::Str.coerce(AttrValue::from("plain")),
            Ok(AttrValue::from("plain"))
        );
    }

    #[test]
    fn coerce_list_from_literal_string() {
        assert_eq!(
            AttrType::List.coerce(AttrValue::from("['a', 'b']")),
            Ok(AttrValue::List(vec![AttrValue::from("a"), AttrValue::from("b")]))
        );
        assert!(AttrType::List.coerce(AttrValue::Int(1)).is_err());
    }

    #[test]
    fn json_encoding_keeps_int_and_float_apart() {
        let json = serde_json::to_string(&vec![AttrValue::Int(1), AttrValue::Float(1.0)])
            .expect("values should serialize");
        assert_eq!(json, "[1,1.0]");
        let decoded: Vec<AttrValue> =
            serde_json::from_str(&json).expect("encoded values should decode");
        assert_eq!(decoded, vec![AttrValue::Int(1), AttrValue::Float(1.0)]);
    }
}
