use serde_json::Value;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::Error;
use crate::key::{IdentityKey, ResourceKind};
use crate::mapper::HydrationContext;
use crate::resource::{PageItem, Parsed, Resource, ResourceArray, UnresolvedItem, not_resolvable_links};

/// Sections of a page's `includes` built ahead of its items.
const INCLUDE_SECTIONS: [&str; 2] = ["Entry", "Asset"];

/// Dispatches raw documents to the mapper of their kind and registers the
/// results with the client's repository.
pub(crate) struct ResourceBuilder<'c> {
    client: &'c Client,
}

impl<'c> ResourceBuilder<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        ResourceBuilder { client }
    }

    pub(crate) fn build(&self, raw: &Value) -> Result<Parsed, Error> {
        match raw.get("items") {
            Some(items) => self.build_array(raw, items).map(Parsed::Array),
            None => self.build_resource(raw).map(Parsed::Resource),
        }
    }

    /// Builds a single resource, or returns the instance already cached
    /// under its identity key.
    pub(crate) fn build_resource(&self, raw: &Value) -> Result<Resource, Error> {
        let kind = ResourceKind::of_document(raw)?;
        let id = raw
            .pointer("/sys/id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::mapping(kind, "<unknown>", "missing sys.id"))?;
        let locale = raw.pointer("/sys/locale").and_then(Value::as_str);
        let key = IdentityKey::new(kind, id, locale);

        let repository = self.client.repository();
        if let Some(existing) = repository.find(&key) {
            debug!(%key, "cache hit");
            return Ok(existing);
        }

        let content_type = match kind {
            ResourceKind::Entry => raw.pointer("/sys/contentType/sys/id").and_then(Value::as_str),
            _ => None,
        };
        let mapper = self.client.mappers().mapper_for(kind, content_type);
        let resource = mapper.hydrate(raw, &HydrationContext::new(self.client))?;

        repository.set(resource.clone());
        Ok(resource)
    }

    fn build_array(&self, raw: &Value, items: &Value) -> Result<ResourceArray, Error> {
        let items = items.as_array().ok_or_else(|| Error::UnexpectedKind {
            expected: "an array of items",
            found: type_name(items).to_string(),
        })?;

        // Included resources go first so links from items hit the cache.
        if let Some(includes) = raw.get("includes") {
            for section in INCLUDE_SECTIONS {
                for include in includes.get(section).and_then(Value::as_array).into_iter().flatten() {
                    if let Err(err) = self.build_resource(include) {
                        if !err.is_recoverable() {
                            return Err(err);
                        }
                        warn!(section, error = %err, "skipping unbuildable include");
                    }
                }
            }
        }

        let mut built = Vec::with_capacity(items.len());
        for item in items {
            match self.build_resource(item) {
                Ok(resource) => built.push(PageItem::Resource(resource)),
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "page item left unresolved");
                    built.push(PageItem::Unresolved(UnresolvedItem::new(item, &err)));
                }
                Err(err) => return Err(err),
            }
        }

        let count = built.len() as u64;
        Ok(ResourceArray {
            total: raw.get("total").and_then(Value::as_u64).unwrap_or(count),
            skip: raw.get("skip").and_then(Value::as_u64).unwrap_or(0),
            limit: raw.get("limit").and_then(Value::as_u64).unwrap_or(count),
            items: built,
            not_resolvable: not_resolvable_links(raw),
        })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
