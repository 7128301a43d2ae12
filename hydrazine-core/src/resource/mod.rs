//! Hydrated resources, one type per kind, and pages of them.

mod array;
mod asset;
mod content_type;
mod deleted;
mod entry;
mod space;

use std::rc::Rc;

use serde::{Serialize, Serializer};
use serde_json::Value;

pub use array::{PageItem, ResourceArray, UnresolvedItem};
pub(crate) use array::not_resolvable_links;
pub use asset::{Asset, AssetFile};
pub use content_type::{ContentType, ContentTypeField};
pub use deleted::DeletedResource;
pub use entry::Entry;
pub use space::Space;

use crate::error::Error;
use crate::key::{IdentityKey, ResourceKind};
use crate::sys::SystemProperties;

/// A built resource. Cloning clones the handle, not the resource.
#[derive(Debug, Clone)]
pub enum Resource {
    Space(Rc<Space>),
    ContentType(Rc<ContentType>),
    Entry(Rc<Entry>),
    Asset(Rc<Asset>),
    DeletedEntry(Rc<DeletedResource>),
    DeletedAsset(Rc<DeletedResource>),
}

impl Resource {
    pub fn sys(&self) -> &SystemProperties {
        match self {
            Resource::Space(space) => space.sys(),
            Resource::ContentType(content_type) => content_type.sys(),
            Resource::Entry(entry) => entry.sys(),
            Resource::Asset(asset) => asset.sys(),
            Resource::DeletedEntry(deleted) | Resource::DeletedAsset(deleted) => deleted.sys(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.sys().kind()
    }

    pub fn id(&self) -> &str {
        self.sys().id()
    }

    /// The key this resource is cached under.
    pub fn identity_key(&self) -> IdentityKey {
        let sys = self.sys();
        IdentityKey::new(sys.kind(), sys.id(), sys.locale())
    }

    /// Returns true if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        match (self, other) {
            (Resource::Space(a), Resource::Space(b)) => Rc::ptr_eq(a, b),
            (Resource::ContentType(a), Resource::ContentType(b)) => Rc::ptr_eq(a, b),
            (Resource::Entry(a), Resource::Entry(b)) => Rc::ptr_eq(a, b),
            (Resource::Asset(a), Resource::Asset(b)) => Rc::ptr_eq(a, b),
            (Resource::DeletedEntry(a), Resource::DeletedEntry(b))
            | (Resource::DeletedAsset(a), Resource::DeletedAsset(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_entry(&self) -> Option<&Rc<Entry>> {
        match self {
            Resource::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Rc<Asset>> {
        match self {
            Resource::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn into_space(self) -> Result<Rc<Space>, Error> {
        match self {
            Resource::Space(space) => Ok(space),
            other => Err(other.unexpected("Space")),
        }
    }

    pub fn into_content_type(self) -> Result<Rc<ContentType>, Error> {
        match self {
            Resource::ContentType(content_type) => Ok(content_type),
            other => Err(other.unexpected("ContentType")),
        }
    }

    pub fn into_entry(self) -> Result<Rc<Entry>, Error> {
        match self {
            Resource::Entry(entry) => Ok(entry),
            other => Err(other.unexpected("Entry")),
        }
    }

    pub fn into_asset(self) -> Result<Rc<Asset>, Error> {
        match self {
            Resource::Asset(asset) => Ok(asset),
            other => Err(other.unexpected("Asset")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedKind {
            expected,
            found: self.identity_key().to_string(),
        }
    }

    /// Renders the resource in the API's own JSON shape.
    pub fn to_json(&self) -> Value {
        match self {
            Resource::Space(space) => space.to_json(),
            Resource::ContentType(content_type) => content_type.to_json(),
            Resource::Entry(entry) => entry.to_json(),
            Resource::Asset(asset) => asset.to_json(),
            Resource::DeletedEntry(deleted) | Resource::DeletedAsset(deleted) => deleted.to_json(),
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resource::Space(a), Resource::Space(b)) => a == b,
            (Resource::ContentType(a), Resource::ContentType(b)) => a == b,
            (Resource::Entry(a), Resource::Entry(b)) => a == b,
            (Resource::Asset(a), Resource::Asset(b)) => a == b,
            (Resource::DeletedEntry(a), Resource::DeletedEntry(b))
            | (Resource::DeletedAsset(a), Resource::DeletedAsset(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// The result of building a document: a single resource or a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Resource(Resource),
    Array(ResourceArray),
}

impl Parsed {
    pub fn into_resource(self) -> Result<Resource, Error> {
        match self {
            Parsed::Resource(resource) => Ok(resource),
            Parsed::Array(_) => Err(Error::UnexpectedKind {
                expected: "a single resource",
                found: "Array".to_string(),
            }),
        }
    }

    pub fn into_array(self) -> Result<ResourceArray, Error> {
        match self {
            Parsed::Array(array) => Ok(array),
            Parsed::Resource(resource) => Err(Error::UnexpectedKind {
                expected: "Array",
                found: resource.identity_key().to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Parsed::Resource(resource) => resource.to_json(),
            Parsed::Array(array) => array.to_json(),
        }
    }
}

impl Serialize for Parsed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}
