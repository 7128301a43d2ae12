use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::Error;

/// Locale slot of resources that carry every locale, or that are not
/// localized at all.
pub const ANY_LOCALE: &str = "*";

/// The resource variant tag, read from `sys.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Space,
    ContentType,
    Entry,
    Asset,
    DeletedEntry,
    DeletedAsset,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Space => "Space",
            ResourceKind::ContentType => "ContentType",
            ResourceKind::Entry => "Entry",
            ResourceKind::Asset => "Asset",
            ResourceKind::DeletedEntry => "DeletedEntry",
            ResourceKind::DeletedAsset => "DeletedAsset",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            ResourceKind::Space => "space",
            ResourceKind::ContentType => "content_type",
            ResourceKind::Entry => "entry",
            ResourceKind::Asset => "asset",
            ResourceKind::DeletedEntry => "deleted_entry",
            ResourceKind::DeletedAsset => "deleted_asset",
        }
    }

    /// Returns true if field values of this kind differ per locale.
    pub fn is_localized(&self) -> bool {
        matches!(self, ResourceKind::Entry | ResourceKind::Asset)
    }

    /// Returns true if resources of this kind may be written to the durable tier.
    pub fn is_durable(&self) -> bool {
        matches!(self, ResourceKind::Space | ResourceKind::ContentType)
    }

    /// Reads the kind of a raw document from its `sys.type`.
    pub fn of_document(raw: &Value) -> Result<Self, Error> {
        match raw.pointer("/sys/type").and_then(Value::as_str) {
            Some(ty) => ty.parse(),
            None => Err(Error::UnrecognizedResourceKind(None)),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Space" => Ok(ResourceKind::Space),
            "ContentType" => Ok(ResourceKind::ContentType),
            "Entry" => Ok(ResourceKind::Entry),
            "Asset" => Ok(ResourceKind::Asset),
            "DeletedEntry" => Ok(ResourceKind::DeletedEntry),
            "DeletedAsset" => Ok(ResourceKind::DeletedAsset),
            other => Err(Error::UnrecognizedResourceKind(Some(other.to_string()))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite identity of a cached resource: kind, id and locale.
///
/// Kinds that are not localized always carry [`ANY_LOCALE`], whatever locale
/// they were requested in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    kind: ResourceKind,
    id: String,
    locale: String,
}

impl IdentityKey {
    pub fn new(kind: ResourceKind, id: impl Into<String>, locale: Option<&str>) -> Self {
        let locale = match locale {
            Some(locale) if kind.is_localized() => locale,
            _ => ANY_LOCALE,
        };
        IdentityKey {
            kind,
            id: id.into(),
            locale: locale.to_string(),
        }
    }

    pub fn space(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Space, id, None)
    }

    pub fn content_type(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::ContentType, id, None)
    }

    pub fn entry(id: impl Into<String>, locale: &str) -> Self {
        Self::new(ResourceKind::Entry, id, Some(locale))
    }

    pub fn asset(id: impl Into<String>, locale: &str) -> Self {
        Self::new(ResourceKind::Asset, id, Some(locale))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Stable string addressing this resource in a durable cache namespace.
    pub fn durable_key(&self, namespace: &str) -> String {
        format!("{namespace}.{}.{}", self.kind.slug(), self.id)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.id, self.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locale_ignored_for_unlocalized_kinds() {
        let k1 = IdentityKey::new(ResourceKind::ContentType, "cat", Some("en-US"));
        let k2 = IdentityKey::content_type("cat");
        assert_eq!(k1, k2);
        assert_eq!(k1.locale(), ANY_LOCALE);
    }

    #[test]
    fn entries_keyed_per_locale() {
        let en = IdentityKey::entry("nyancat", "en-US");
        let tlh = IdentityKey::entry("nyancat", "tlh");
        assert_ne!(en, tlh);
        assert_ne!(en, IdentityKey::entry("nyancat", ANY_LOCALE));
    }

    #[test]
    fn key_display() {
        let key = IdentityKey::asset("nyancat", "en-US");
        assert_eq!(key.to_string(), "Asset:nyancat:en-US");
    }

    #[test]
    fn durable_key_is_stable() {
        let key = IdentityKey::content_type("cat");
        assert_eq!(
            key.durable_key("hydrazine.cfexampleapi.master"),
            "hydrazine.cfexampleapi.master.content_type.cat"
        );
    }

    #[test]
    fn kind_of_document() {
        let raw = json!({"sys": {"type": "DeletedEntry", "id": "x"}});
        assert_eq!(ResourceKind::of_document(&raw).unwrap(), ResourceKind::DeletedEntry);

        let unknown = json!({"sys": {"type": "Widget"}});
        assert!(matches!(
            ResourceKind::of_document(&unknown),
            Err(Error::UnrecognizedResourceKind(Some(ref ty))) if ty == "Widget"
        ));

        let missing = json!({"fields": {}});
        assert!(matches!(
            ResourceKind::of_document(&missing),
            Err(Error::UnrecognizedResourceKind(None))
        ));
    }
}
