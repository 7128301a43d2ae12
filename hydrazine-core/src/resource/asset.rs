use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Error;
use crate::field::FieldValue;
use crate::locale::{LocaleContext, LocalizedFields};
use crate::sys::SystemProperties;

/// The `file` field of an asset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// A media asset. Assets hold no links.
#[derive(Debug)]
pub struct Asset {
    pub(crate) sys: SystemProperties,
    pub(crate) fields: LocalizedFields,
    pub(crate) locale: LocaleContext,
}

impl Asset {
    pub fn sys(&self) -> &SystemProperties {
        &self.sys
    }

    pub fn id(&self) -> &str {
        self.sys.id()
    }

    pub fn fields(&self) -> &LocalizedFields {
        &self.fields
    }

    pub fn locale(&self) -> String {
        self.locale.current()
    }

    pub fn set_locale(&self, code: &str) -> Result<(), Error> {
        self.locale.set(code)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.field_in(name, &self.locale.current())
    }

    pub fn field_in(&self, name: &str, locale: &str) -> Option<&FieldValue> {
        self.fields.get_in(name, locale, self.locale.locales())
    }

    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(FieldValue::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.field("description").and_then(FieldValue::as_str)
    }

    pub fn file(&self) -> Option<AssetFile> {
        let raw = self.field("file")?.as_json()?;
        AssetFile::deserialize(raw).ok()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "sys": self.sys.to_json(),
            "fields": self.fields.to_json(self.sys.locale()),
        })
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.sys == other.sys && self.fields == other.fields
    }
}
