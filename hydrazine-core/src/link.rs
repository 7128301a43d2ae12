use std::fmt;

use serde_json::{Value, json};

use crate::key::ResourceKind;

/// The kind of resource a link points at (`sys.linkType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Entry,
    Asset,
    Space,
    ContentType,
    Environment,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Entry => "Entry",
            LinkKind::Asset => "Asset",
            LinkKind::Space => "Space",
            LinkKind::ContentType => "ContentType",
            LinkKind::Environment => "Environment",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Entry" => Some(LinkKind::Entry),
            "Asset" => Some(LinkKind::Asset),
            "Space" => Some(LinkKind::Space),
            "ContentType" => Some(LinkKind::ContentType),
            "Environment" => Some(LinkKind::Environment),
            _ => None,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, unresolved reference from field data to another resource.
///
/// Links are never cached themselves. Resolving one goes through the owning
/// client, which looks up (or fetches) the target by its identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    kind: LinkKind,
    id: String,
}

impl Link {
    pub fn new(kind: LinkKind, id: impl Into<String>) -> Self {
        Link { kind, id: id.into() }
    }

    pub fn entry(id: impl Into<String>) -> Self {
        Self::new(LinkKind::Entry, id)
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::new(LinkKind::Asset, id)
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the resource kind of the target, if it is a cacheable one.
    pub fn target_kind(&self) -> Option<ResourceKind> {
        match self.kind {
            LinkKind::Entry => Some(ResourceKind::Entry),
            LinkKind::Asset => Some(ResourceKind::Asset),
            LinkKind::Space => Some(ResourceKind::Space),
            LinkKind::ContentType => Some(ResourceKind::ContentType),
            LinkKind::Environment => None,
        }
    }

    /// Parses a link object: `{"sys": {"type": "Link", "linkType": .., "id": ..}}`.
    ///
    /// Returns `None` for anything else, including links of an unknown type.
    pub fn from_json(raw: &Value) -> Option<Self> {
        let sys = raw.get("sys")?;
        if sys.get("type").and_then(Value::as_str) != Some("Link") {
            return None;
        }
        let kind = LinkKind::parse(sys.get("linkType")?.as_str()?)?;
        let id = sys.get("id")?.as_str()?;
        Some(Link::new(kind, id))
    }

    pub fn to_json(&self) -> Value {
        json!({
            "sys": {
                "type": "Link",
                "linkType": self.kind.as_str(),
                "id": self.id,
            }
        })
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.kind, self.id)
    }
}
