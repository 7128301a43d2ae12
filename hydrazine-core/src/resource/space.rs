use serde_json::{Value, json};

use crate::locale::Locale;
use crate::sys::SystemProperties;

/// A space: the container every other resource belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    pub(crate) sys: SystemProperties,
    pub(crate) name: String,
    pub(crate) locales: Vec<Locale>,
}

impl Space {
    pub(crate) fn new(sys: SystemProperties) -> Self {
        Space {
            sys,
            name: String::new(),
            locales: Vec::new(),
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

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    pub fn locale(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    pub fn default_locale(&self) -> Option<&Locale> {
        self.locales.iter().find(|locale| locale.default)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "sys": self.sys.to_json(),
            "name": self.name,
            "locales": self.locales,
        })
    }
}
