use serde_json::Value;

use crate::link::Link;

/// One locale's value of a field.
///
/// Link objects are lifted into [`Link`]s, including inside arrays; anything
/// else is kept as raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Link(Link),
    Array(Vec<FieldValue>),
    Json(Value),
}

impl FieldValue {
    pub fn from_json(raw: &Value) -> Self {
        if let Some(link) = Link::from_json(raw) {
            return FieldValue::Link(link);
        }
        if let Value::Array(items) = raw {
            if items.iter().any(|item| Link::from_json(item).is_some()) {
                return FieldValue::Array(items.iter().map(FieldValue::from_json).collect());
            }
        }
        FieldValue::Json(raw.clone())
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Link(link) => link.to_json(),
            FieldValue::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Json(value) => value.clone(),
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            FieldValue::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    /// Every link in this value, in document order.
    pub fn links(&self) -> Vec<&Link> {
        match self {
            FieldValue::Link(link) => vec![link],
            FieldValue::Array(items) => items.iter().flat_map(FieldValue::links).collect(),
            FieldValue::Json(_) => Vec::new(),
        }
    }
}
