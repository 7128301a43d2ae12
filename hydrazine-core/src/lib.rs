//! Hydrazine turns raw content-delivery JSON into typed, cross-referencing
//! resources with one live instance per logical resource.
//!
//! Core concepts:
//! - **IdentityKey**: kind, id and locale of a resource; one live instance per key
//! - **InstanceRepository**: the per-client identity cache, optionally backed by a
//!   durable tier for spaces and content types
//! - **Mapper**: hydrates one raw document of a known kind into a resource
//! - **Link**: a typed, unresolved reference, resolved lazily through the client
//! - **Client**: owns all of the above and the caller-supplied [`Transport`]
//!
//! # Example
//!
//! ```ignore
//! use hydrazine_core::{Client, ClientConfig};
//!
//! let client = Client::builder(ClientConfig::new("cfexampleapi"), transport).build()?;
//!
//! let nyancat = client.get_entry("nyancat", Some("en-US"))?;
//! let friend = nyancat.linked_entry("bestFriend")?.unwrap();
//!
//! // Following the link back yields the very same instance.
//! let back = friend.linked_entry("bestFriend")?.unwrap();
//! assert!(std::rc::Rc::ptr_eq(&nyancat, &back));
//! ```
//!
//! Resources are `Rc`-shared and the client is single-threaded.

mod builder;
mod cache;
mod client;
mod config;
mod error;
mod field;
mod key;
mod link;
mod locale;
mod mapper;
mod repository;
mod resource;
mod sys;

pub use cache::{DurableCache, MemoryCache};
pub use client::{Client, ClientBuilder, Transport};
pub use config::{CacheConfig, ClientConfig};
pub use error::{CacheError, Error, TransportError};
pub use field::FieldValue;
pub use key::{ANY_LOCALE, IdentityKey, ResourceKind};
pub use link::{Link, LinkKind};
pub use locale::{Locale, LocaleContext, LocalizedFields, LocalizedValue, fallback_chain, normalize_field};
pub use mapper::{
    AssetMapper, ContentTypeMapper, DeletedMapper, EntryMapper, EntryModel, HydrationContext, Mapper,
    MapperRegistry, ModelMapper, SpaceMapper,
};
pub use repository::InstanceRepository;
pub use resource::{
    Asset, AssetFile, ContentType, ContentTypeField, DeletedResource, Entry, PageItem, Parsed, Resource,
    ResourceArray, Space, UnresolvedItem,
};
pub use sys::SystemProperties;
