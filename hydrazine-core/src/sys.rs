use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::Client;
use crate::error::Error;
use crate::key::ResourceKind;
use crate::link::{Link, LinkKind};
use crate::resource::{ContentType, Space};

/// `sys` as it appears on the wire; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSys {
    id: Option<String>,
    space: Option<Value>,
    content_type: Option<Value>,
    environment: Option<Value>,
    revision: Option<u64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    locale: Option<String>,
}

/// Metadata shared by every resource.
///
/// The space and content type are the instances held by the owning client's
/// repository, never copies parsed inline.
#[derive(Debug, Clone)]
pub struct SystemProperties {
    pub(crate) id: String,
    pub(crate) kind: ResourceKind,
    pub(crate) space: Option<Rc<Space>>,
    pub(crate) content_type: Option<Rc<ContentType>>,
    pub(crate) environment: Option<String>,
    pub(crate) revision: Option<u64>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) deleted_at: Option<DateTime<Utc>>,
    pub(crate) locale: Option<String>,
}

impl SystemProperties {
    #[cfg(test)]
    pub(crate) fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        SystemProperties {
            id: id.into(),
            kind,
            space: None,
            content_type: None,
            environment: None,
            revision: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
            locale: None,
        }
    }

    /// Builds system properties from a raw document's `sys`, looking the
    /// space and content type up through `client`.
    pub(crate) fn hydrate(raw: &Value, kind: ResourceKind, client: &Client) -> Result<Self, Error> {
        let sys = match raw.get("sys") {
            Some(sys) => RawSys::deserialize(sys)
                .map_err(|err| Error::mapping(kind, "<unknown>", err.to_string()))?,
            None => RawSys::default(),
        };
        let id = sys
            .id
            .ok_or_else(|| Error::mapping(kind, "<unknown>", "missing sys.id"))?;
        if kind == ResourceKind::Space && id != client.config().space_id {
            return Err(Error::SpaceMismatch {
                expected: client.config().space_id.clone(),
                found: id,
            });
        }

        let space = match sys.space.as_ref().and_then(Link::from_json) {
            Some(link) => {
                let expected = &client.config().space_id;
                if link.id() != expected {
                    return Err(Error::SpaceMismatch {
                        expected: expected.clone(),
                        found: link.id().to_string(),
                    });
                }
                Some(client.get_space()?)
            }
            None => None,
        };

        let content_type = match sys.content_type.as_ref().and_then(Link::from_json) {
            Some(link) => Some(client.get_content_type(link.id())?),
            None => None,
        };

        let environment = sys
            .environment
            .as_ref()
            .and_then(Link::from_json)
            .map(|link| link.id().to_string());

        Ok(SystemProperties {
            id,
            kind,
            space,
            content_type,
            environment,
            revision: sys.revision,
            created_at: sys.created_at,
            updated_at: sys.updated_at,
            deleted_at: sys.deleted_at,
            locale: sys.locale,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn space(&self) -> Option<&Rc<Space>> {
        self.space.as_ref()
    }

    pub fn content_type(&self) -> Option<&Rc<ContentType>> {
        self.content_type.as_ref()
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// The locale of a single-locale document; `None` when it carries every locale.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn to_json(&self) -> Value {
        let mut sys = Map::new();
        sys.insert("id".into(), Value::from(self.id.as_str()));
        sys.insert("type".into(), Value::from(self.kind.as_str()));
        if let Some(space) = &self.space {
            sys.insert("space".into(), Link::new(LinkKind::Space, space.id()).to_json());
        }
        if let Some(content_type) = &self.content_type {
            sys.insert(
                "contentType".into(),
                Link::new(LinkKind::ContentType, content_type.id()).to_json(),
            );
        }
        if let Some(environment) = &self.environment {
            sys.insert(
                "environment".into(),
                Link::new(LinkKind::Environment, environment.as_str()).to_json(),
            );
        }
        if let Some(revision) = self.revision {
            sys.insert("revision".into(), Value::from(revision));
        }
        for (name, at) in [
            ("createdAt", self.created_at),
            ("updatedAt", self.updated_at),
            ("deletedAt", self.deleted_at),
        ] {
            if let Some(at) = at {
                sys.insert(name.into(), Value::from(at.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
            }
        }
        if let Some(locale) = &self.locale {
            sys.insert("locale".into(), Value::from(locale.as_str()));
        }
        Value::Object(sys)
    }
}

impl PartialEq for SystemProperties {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.space.as_ref().map(|s| s.id()) == other.space.as_ref().map(|s| s.id())
            && self.content_type.as_ref().map(|c| c.id())
                == other.content_type.as_ref().map(|c| c.id())
            && self.environment == other.environment
            && self.revision == other.revision
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.deleted_at == other.deleted_at
            && self.locale == other.locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_omits_absent_keys() {
        let sys = SystemProperties::new("cfexampleapi", ResourceKind::Space);
        assert_eq!(
            sys.to_json(),
            serde_json::json!({"id": "cfexampleapi", "type": "Space"})
        );
    }

    #[test]
    fn timestamps_render_as_rfc3339() {
        let mut sys = SystemProperties::new("x", ResourceKind::DeletedEntry);
        sys.deleted_at = Some(Utc.with_ymd_and_hms(2014, 8, 11, 8, 30, 42).unwrap());
        sys.revision = Some(3);
        let json = sys.to_json();
        assert_eq!(json["deletedAt"], "2014-08-11T08:30:42Z");
        assert_eq!(json["revision"], 3);
    }
}
