//! Hydration of raw documents into resources, one mapper per kind.
//!
//! Every mapper follows the same two phases: allocate the target with
//! defaults, then fill it from the raw document. Entries whose content type
//! has a registered [`EntryModel`] additionally get a model allocated and
//! hydrated from the finished entry.

use std::any::Any;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::Client;
use crate::error::Error;
use crate::key::ResourceKind;
use crate::locale::{Locale, LocaleContext, LocalizedFields};
use crate::resource::{Asset, ContentType, ContentTypeField, DeletedResource, Entry, Resource, Space};
use crate::sys::SystemProperties;

/// Turns one raw document of a known kind into a resource.
pub trait Mapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error>;
}

/// What a mapper may reach while hydrating: the owning client's lookups
/// and its repository.
pub struct HydrationContext<'c> {
    client: &'c Client,
}

impl<'c> HydrationContext<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        HydrationContext { client }
    }

    pub fn system_properties(&self, raw: &Value, kind: ResourceKind) -> Result<SystemProperties, Error> {
        SystemProperties::hydrate(raw, kind, self.client)
    }

    /// Locale list of the space and the locale fields are first viewed in:
    /// the document's own locale, else the client default.
    pub fn locale_context(&self, sys: &SystemProperties) -> Result<LocaleContext, Error> {
        let space = self.client.get_space()?;
        let current = match sys.locale() {
            Some(locale) => locale.to_string(),
            None => self.client.default_locale()?,
        };
        Ok(LocaleContext::new(space.locales().to_vec(), current))
    }

    /// Registers a resource before its hydration has finished.
    pub fn register(&self, resource: &Resource) {
        self.client.repository().set(resource.clone());
    }

    fn client_ref(&self) -> Weak<Client> {
        self.client.weak()
    }
}

fn read<T: DeserializeOwned>(raw: &Value, key: &str, sys: &SystemProperties) -> Result<Option<T>, Error> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Deserialize::deserialize(value)
            .map(Some)
            .map_err(|err| Error::mapping(sys.kind(), sys.id(), format!("{key}: {err}"))),
    }
}

pub struct SpaceMapper;

impl Mapper for SpaceMapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error> {
        let sys = ctx.system_properties(raw, ResourceKind::Space)?;
        let name = read::<String>(raw, "name", &sys)?;
        let locales = read::<Vec<Locale>>(raw, "locales", &sys)?;

        let mut space = Space::new(sys);
        space.name = name.unwrap_or_default();
        space.locales = locales.unwrap_or_default();
        Ok(Resource::Space(Rc::new(space)))
    }
}

pub struct ContentTypeMapper;

impl Mapper for ContentTypeMapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error> {
        let sys = ctx.system_properties(raw, ResourceKind::ContentType)?;
        let name = read::<String>(raw, "name", &sys)?;
        let description = read::<String>(raw, "description", &sys)?;
        let display_field = read::<String>(raw, "displayField", &sys)?;
        let fields = read::<Vec<ContentTypeField>>(raw, "fields", &sys)?;

        let mut content_type = ContentType::new(sys);
        content_type.name = name.unwrap_or_default();
        content_type.description = description;
        content_type.display_field = display_field;
        content_type.fields = fields.unwrap_or_default();
        Ok(Resource::ContentType(Rc::new(content_type)))
    }
}

pub struct EntryMapper;

impl EntryMapper {
    fn allocate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Rc<Entry>, Error> {
        let sys = ctx.system_properties(raw, ResourceKind::Entry)?;
        let fields = LocalizedFields::from_document(sys.kind(), sys.id(), raw.get("fields"), sys.locale())?;
        let locale = ctx.locale_context(&sys)?;
        Ok(Rc::new(Entry {
            sys,
            fields,
            locale,
            client: ctx.client_ref(),
            model: OnceCell::new(),
        }))
    }
}

impl Mapper for EntryMapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error> {
        self.allocate(raw, ctx).map(Resource::Entry)
    }
}

pub struct AssetMapper;

impl Mapper for AssetMapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error> {
        let sys = ctx.system_properties(raw, ResourceKind::Asset)?;
        let fields = LocalizedFields::from_document(sys.kind(), sys.id(), raw.get("fields"), sys.locale())?;
        let locale = ctx.locale_context(&sys)?;
        Ok(Resource::Asset(Rc::new(Asset { sys, fields, locale })))
    }
}

/// Mapper for deletion markers; they carry only system properties.
pub struct DeletedMapper(pub ResourceKind);

impl Mapper for DeletedMapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error> {
        let sys = ctx.system_properties(raw, self.0)?;
        let deleted = Rc::new(DeletedResource { sys });
        match self.0 {
            ResourceKind::DeletedEntry => Ok(Resource::DeletedEntry(deleted)),
            ResourceKind::DeletedAsset => Ok(Resource::DeletedAsset(deleted)),
            other => Err(Error::mapping(other, deleted.id(), "not a deletion marker")),
        }
    }
}

/// A caller-defined shape for entries of one content type.
///
/// The model is allocated with `Default` and then filled from the finished
/// entry. The entry is already registered when `hydrate` runs, so following
/// links back to it yields the same instance.
pub trait EntryModel: Default + 'static {
    fn hydrate(&mut self, entry: &Entry) -> Result<(), Error>;
}

type HydrateModel = fn(&Entry) -> Result<Box<dyn Any>, Error>;

fn hydrate_model<T: EntryModel>(entry: &Entry) -> Result<Box<dyn Any>, Error> {
    let mut model = T::default();
    model.hydrate(entry)?;
    Ok(Box::new(model))
}

/// Entry mapper for a content type with a registered model.
pub struct ModelMapper {
    hydrate: HydrateModel,
}

impl ModelMapper {
    pub fn new<T: EntryModel>() -> Self {
        ModelMapper {
            hydrate: hydrate_model::<T>,
        }
    }
}

impl Mapper for ModelMapper {
    fn hydrate(&self, raw: &Value, ctx: &HydrationContext<'_>) -> Result<Resource, Error> {
        let entry = EntryMapper.allocate(raw, ctx)?;
        let resource = Resource::Entry(Rc::clone(&entry));
        let repository = ctx.client.repository();
        let checkpoint = repository.checkpoint();
        ctx.register(&resource);

        // Anything registered meanwhile may hold this entry, so it goes too.
        match (self.hydrate)(&entry) {
            Ok(model) => {
                repository.commit(checkpoint);
                let fresh = entry.model.set(model).is_ok();
                debug_assert!(fresh, "model cell of a new entry is empty");
                Ok(resource)
            }
            Err(err) => {
                repository.rollback(checkpoint);
                Err(err)
            }
        }
    }
}

static DELETED_ENTRY: DeletedMapper = DeletedMapper(ResourceKind::DeletedEntry);
static DELETED_ASSET: DeletedMapper = DeletedMapper(ResourceKind::DeletedAsset);

/// Dispatch table from kind (and content type) to mapper.
#[derive(Default)]
pub struct MapperRegistry {
    models: HashMap<String, ModelMapper>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrates entries of `content_type` into `T` from now on.
    pub fn register<T: EntryModel>(&mut self, content_type: impl Into<String>) {
        self.models.insert(content_type.into(), ModelMapper::new::<T>());
    }

    pub fn has_model(&self, content_type: &str) -> bool {
        self.models.contains_key(content_type)
    }

    pub fn mapper_for(&self, kind: ResourceKind, content_type: Option<&str>) -> &dyn Mapper {
        match kind {
            ResourceKind::Space => &SpaceMapper,
            ResourceKind::ContentType => &ContentTypeMapper,
            ResourceKind::Entry => match content_type.and_then(|id| self.models.get(id)) {
                Some(mapper) => mapper as &dyn Mapper,
                None => &EntryMapper,
            },
            ResourceKind::Asset => &AssetMapper,
            ResourceKind::DeletedEntry => &DELETED_ENTRY,
            ResourceKind::DeletedAsset => &DELETED_ASSET,
        }
    }
}
