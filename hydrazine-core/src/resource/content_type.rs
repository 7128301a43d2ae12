use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sys::SystemProperties;

/// Definition of one field of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeField {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    /// Item definition of `Array` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
}

/// The schema entries of one shape are built against.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    pub(crate) sys: SystemProperties,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) display_field: Option<String>,
    pub(crate) fields: Vec<ContentTypeField>,
}

impl ContentType {
    pub(crate) fn new(sys: SystemProperties) -> Self {
        ContentType {
            sys,
            name: String::new(),
            description: None,
            display_field: None,
            fields: Vec::new(),
        }
    }

    pub fn sys(&self) -> &SystemProperties {
        &self.sys
    }

    pub fn id(&self) -> &str {
        self.sys.id()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn display_field(&self) -> Option<&ContentTypeField> {
        let id = self.display_field.as_deref()?;
        self.field(id)
    }

    pub fn fields(&self) -> &[ContentTypeField] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&ContentTypeField> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("sys".into(), self.sys.to_json());
        out.insert("name".into(), Value::from(self.name.as_str()));
        if let Some(description) = &self.description {
            out.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(display_field) = &self.display_field {
            out.insert("displayField".into(), Value::from(display_field.as_str()));
        }
        out.insert(
            "fields".into(),
            serde_json::to_value(&self.fields).unwrap_or_default(),
        );
        Value::Object(out)
    }
}
