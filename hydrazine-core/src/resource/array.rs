use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::error::Error;
use crate::link::Link;
use crate::resource::Resource;

/// A page item that could not be built.
///
/// Keeps the raw document so that serializing the page reproduces it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedItem {
    kind: Option<String>,
    id: Option<String>,
    reason: String,
    raw: Value,
}

impl UnresolvedItem {
    pub(crate) fn new(raw: &Value, error: &Error) -> Self {
        let read = |pointer: &str| raw.pointer(pointer).and_then(Value::as_str).map(str::to_string);
        UnresolvedItem {
            kind: read("/sys/type"),
            id: read("/sys/id"),
            reason: error.to_string(),
            raw: raw.clone(),
        }
    }

    /// The raw `sys.type`, if the item had one.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    Resource(Resource),
    Unresolved(UnresolvedItem),
}

impl PageItem {
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            PageItem::Resource(resource) => Some(resource),
            PageItem::Unresolved(_) => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, PageItem::Unresolved(_))
    }

    fn to_json(&self) -> Value {
        match self {
            PageItem::Resource(resource) => resource.to_json(),
            PageItem::Unresolved(item) => item.raw.clone(),
        }
    }
}

/// An ordered, immutable page of built resources.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceArray {
    pub(crate) total: u64,
    pub(crate) skip: u64,
    pub(crate) limit: u64,
    pub(crate) items: Vec<PageItem>,
    pub(crate) not_resolvable: Vec<Link>,
}

impl ResourceArray {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PageItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[PageItem] {
        &self.items
    }

    /// The successfully built items, in order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter().filter_map(PageItem::resource)
    }

    /// Links the API reported it could not resolve for this page.
    pub fn not_resolvable(&self) -> &[Link] {
        &self.not_resolvable
    }

    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "sys": {"type": "Array"},
            "total": self.total,
            "skip": self.skip,
            "limit": self.limit,
            "items": self.items.iter().map(PageItem::to_json).collect::<Vec<_>>(),
        });
        if !self.not_resolvable.is_empty() {
            out["errors"] = self
                .not_resolvable
                .iter()
                .map(|link| {
                    json!({
                        "sys": {"type": "error", "id": "notResolvable"},
                        "details": {
                            "type": "Link",
                            "linkType": link.kind().as_str(),
                            "id": link.id(),
                        },
                    })
                })
                .collect();
        }
        out
    }
}

impl Serialize for ResourceArray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// Reads the `notResolvable` entries of a page's `errors`.
pub(crate) fn not_resolvable_links(raw: &Value) -> Vec<Link> {
    raw.get("errors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|error| error.pointer("/sys/id").and_then(Value::as_str) == Some("notResolvable"))
        .filter_map(|error| {
            let details = error.get("details")?;
            Link::from_json(&json!({
                "sys": {
                    "type": "Link",
                    "linkType": details.get("linkType")?,
                    "id": details.get("id")?,
                }
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_not_resolvable_errors() {
        let raw = json!({
            "errors": [
                {
                    "sys": {"type": "error", "id": "notResolvable"},
                    "details": {"type": "Link", "linkType": "Entry", "id": "gone"},
                },
                {"sys": {"type": "error", "id": "somethingElse"}},
            ]
        });
        assert_eq!(not_resolvable_links(&raw), vec![Link::entry("gone")]);
    }

    #[test]
    fn unresolved_item_keeps_raw_kind_and_id() {
        let raw = json!({"sys": {"type": "Widget", "id": "w1"}});
        let err = Error::UnrecognizedResourceKind(Some("Widget".into()));
        let item = UnresolvedItem::new(&raw, &err);
        assert_eq!(item.kind(), Some("Widget"));
        assert_eq!(item.id(), Some("w1"));
        assert_eq!(item.raw(), &raw);
    }
}
