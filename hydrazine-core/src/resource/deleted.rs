use serde_json::{Value, json};

use crate::sys::SystemProperties;

/// Marker for an entry or asset removed since the last sync.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedResource {
    pub(crate) sys: SystemProperties,
}

impl DeletedResource {
    pub fn sys(&self) -> &SystemProperties {
        &self.sys
    }

    pub fn id(&self) -> &str {
        self.sys.id()
    }

    pub fn to_json(&self) -> Value {
        json!({ "sys": self.sys.to_json() })
    }
}
