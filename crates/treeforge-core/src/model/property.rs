//! Opaque property bags attached to templates and blocks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered key/value bag. Keys are sorted so exports are stable.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single property value.
///
/// The core never interprets these; the enum only exists so editors and the
/// serializer can stay type-safe. Serialized untagged, so a bag is plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Finite numbers only; NaN and infinities have no JSON form.
    pub fn number(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Number)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name, used by the CLI when listing properties.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_parses_from_plain_json() {
        let bag: Properties =
            serde_json::from_str(r#"{"maxLoop": 3, "label": "x", "on": true, "nested": {"a": [1, 2]}}"#)
                .unwrap();
        assert_eq!(bag["maxLoop"].as_f64(), Some(3.0));
        assert_eq!(bag["label"].as_str(), Some("x"));
        assert_eq!(bag["on"].as_bool(), Some(true));
        assert_eq!(bag["nested"].kind(), "map");
    }

    #[test]
    fn null_is_not_a_property_value() {
        let parsed: Result<Properties, _> = serde_json::from_str(r#"{"a": null}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn serializes_without_tags() {
        let mut bag = Properties::new();
        bag.insert("milliseconds".into(), 1000i64.into());
        bag.insert("scale".into(), PropertyValue::number(0.5).unwrap());
        assert_eq!(
            serde_json::to_string(&bag).unwrap(),
            r#"{"milliseconds":1000,"scale":0.5}"#
        );
    }

    #[test]
    fn non_finite_numbers_have_no_value() {
        assert!(PropertyValue::number(f64::NAN).is_none());
        assert!(PropertyValue::number(f64::INFINITY).is_none());
    }
}
