use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::builder::ResourceBuilder;
use crate::cache::DurableCache;
use crate::config::ClientConfig;
use crate::error::{Error, TransportError};
use crate::key::{ANY_LOCALE, IdentityKey, ResourceKind};
use crate::link::Link;
use crate::mapper::{EntryModel, MapperRegistry};
use crate::repository::InstanceRepository;
use crate::resource::{Asset, ContentType, Entry, Parsed, Resource, ResourceArray, Space};

/// Synchronous request function supplied by the caller.
///
/// Paths are relative to the configured space and environment: `""` for the
/// space itself, `content_types`, `content_types/<id>`, `entries`,
/// `entries/<id>`, `assets` and `assets/<id>`.
pub trait Transport {
    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, TransportError> {
        (**self).fetch(path, query)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, TransportError> {
        (**self).fetch(path, query)
    }
}

/// Entry point: owns the transport, the instance repository and the mapper
/// registry of one space and environment.
///
/// Clients are always handed out as `Rc<Client>`; entries keep a weak
/// reference back so their links resolve through the same repository.
pub struct Client {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    repository: InstanceRepository,
    mappers: MapperRegistry,
    this: Weak<Client>,
}

impl Client {
    pub fn builder(config: ClientConfig, transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder::new(config, transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn repository(&self) -> &InstanceRepository {
        &self.repository
    }

    pub(crate) fn mappers(&self) -> &MapperRegistry {
        &self.mappers
    }

    pub(crate) fn weak(&self) -> Weak<Client> {
        self.this.clone()
    }

    /// The locale used when a call names none: the configured locale, else
    /// the space default, else every locale.
    pub fn default_locale(&self) -> Result<String, Error> {
        if let Some(locale) = &self.config.locale {
            return Ok(locale.clone());
        }
        let space = self.get_space()?;
        Ok(space
            .default_locale()
            .map(|locale| locale.code.clone())
            .unwrap_or_else(|| ANY_LOCALE.to_string()))
    }

    pub fn get_space(&self) -> Result<Rc<Space>, Error> {
        self.lookup(IdentityKey::space(self.config.space_id.as_str()), "", &[])?
            .into_space()
    }

    pub fn get_content_type(&self, id: &str) -> Result<Rc<ContentType>, Error> {
        self.lookup(IdentityKey::content_type(id), &format!("content_types/{id}"), &[])?
            .into_content_type()
    }

    /// Returns the entry in `locale` (the default locale if `None`), fetching
    /// it on a cache miss.
    pub fn get_entry(&self, id: &str, locale: Option<&str>) -> Result<Rc<Entry>, Error> {
        let locale = self.requested_locale(locale)?;
        self.lookup(
            IdentityKey::entry(id, &locale),
            &format!("entries/{id}"),
            &[("locale", locale.as_str())],
        )?
        .into_entry()
    }

    pub fn get_asset(&self, id: &str, locale: Option<&str>) -> Result<Rc<Asset>, Error> {
        let locale = self.requested_locale(locale)?;
        self.lookup(
            IdentityKey::asset(id, &locale),
            &format!("assets/{id}"),
            &[("locale", locale.as_str())],
        )?
        .into_asset()
    }

    pub fn get_entries(&self, query: &[(&str, &str)]) -> Result<ResourceArray, Error> {
        self.fetch_page("entries", query)
    }

    pub fn get_assets(&self, query: &[(&str, &str)]) -> Result<ResourceArray, Error> {
        self.fetch_page("assets", query)
    }

    pub fn get_content_types(&self) -> Result<ResourceArray, Error> {
        self.fetch_page("content_types", &[])
    }

    /// Resolves an entry or asset link in `locale`, hitting the cache first.
    pub fn resolve_link(&self, link: &Link, locale: Option<&str>) -> Result<Resource, Error> {
        match link.target_kind() {
            Some(ResourceKind::Entry) => self.get_entry(link.id(), locale).map(Resource::Entry),
            Some(ResourceKind::Asset) => self.get_asset(link.id(), locale).map(Resource::Asset),
            _ => Err(Error::InvalidLinkType(link.kind())),
        }
    }

    /// Builds a raw document into a resource or a page.
    pub fn build(&self, raw: &Value) -> Result<Parsed, Error> {
        ResourceBuilder::new(self).build(raw)
    }

    /// Parses and builds a serialized document. Documents from another space
    /// are rejected before anything is built.
    pub fn parse_json(&self, json: &str) -> Result<Parsed, Error> {
        let raw: Value = serde_json::from_str(json)?;
        self.check_space(&raw)?;
        self.build(&raw)
    }

    /// Serializes a resource or page back into the API's JSON shape.
    pub fn to_json(&self, parsed: &Parsed) -> Result<String, Error> {
        Ok(serde_json::to_string(parsed)?)
    }

    /// Fetches the space and every content type and writes them to the
    /// durable tier. Returns how many records were written.
    #[instrument(skip(self))]
    pub fn warm_durable_cache(&self) -> Result<usize, Error> {
        if !self.repository.has_durable_tier() {
            return Err(Error::MisconfiguredCache("no durable cache configured".to_string()));
        }
        let mut written = usize::from(self.repository.store_durable(&Resource::Space(self.get_space()?)));
        for content_type in self.get_content_types()?.resources() {
            written += usize::from(self.repository.store_durable(content_type));
        }
        debug!(written, "durable cache warmed");
        Ok(written)
    }

    fn requested_locale(&self, locale: Option<&str>) -> Result<String, Error> {
        match locale {
            Some(locale) => Ok(locale.to_string()),
            None => self.default_locale(),
        }
    }

    /// Memory first, then the durable tier, then the transport.
    #[instrument(skip(self, query))]
    fn lookup(&self, key: IdentityKey, path: &str, query: &[(&str, &str)]) -> Result<Resource, Error> {
        if let Some(resource) = self.repository.find(&key) {
            debug!("memory hit");
            return Ok(resource);
        }
        // A document carrying every locale serves any single one.
        if key.kind().is_localized() && key.locale() != ANY_LOCALE {
            let any = IdentityKey::new(key.kind(), key.id(), Some(ANY_LOCALE));
            if let Some(resource) = self.repository.find(&any) {
                debug!("memory hit, all locales");
                return Ok(resource);
            }
        }

        let builder = ResourceBuilder::new(self);
        if let Some(raw) = self.repository.load_durable(&key) {
            match builder.build_resource(&raw) {
                Ok(resource) => {
                    debug!("durable hit");
                    return Ok(resource);
                }
                Err(err) => warn!(error = %err, "durable record unusable, fetching"),
            }
        }

        debug!("fetching");
        let raw = self.fetch(path, query).map_err(|err| match err {
            Error::Transport(TransportError::NotFound(_)) => Error::NotFound {
                kind: key.kind(),
                id: key.id().to_string(),
            },
            other => other,
        })?;
        builder.build_resource(&raw)
    }

    #[instrument(skip(self, query))]
    fn fetch_page(&self, path: &str, query: &[(&str, &str)]) -> Result<ResourceArray, Error> {
        let locale;
        let mut query = query.to_vec();
        if path != "content_types" && !query.iter().any(|(name, _)| *name == "locale") {
            locale = self.default_locale()?;
            query.push(("locale", locale.as_str()));
        }
        let raw = self.fetch(path, &query)?;
        let page = self.build(&raw)?.into_array()?;
        debug!(items = page.len(), total = page.total(), "page built");
        Ok(page)
    }

    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, Error> {
        Ok(self.transport.fetch(path, query)?)
    }

    fn check_space(&self, raw: &Value) -> Result<(), Error> {
        // Spaces are checked by their own id, everything else by its space link.
        let found = match ResourceKind::of_document(raw) {
            Ok(ResourceKind::Space) => raw.pointer("/sys/id"),
            _ => raw.pointer("/sys/space/sys/id"),
        };
        if let Some(found) = found.and_then(Value::as_str) {
            if found != self.config.space_id {
                return Err(Error::SpaceMismatch {
                    expected: self.config.space_id.clone(),
                    found: found.to_string(),
                });
            }
        }

        for item in raw.get("items").and_then(Value::as_array).into_iter().flatten() {
            self.check_space(item)?;
        }
        if let Some(includes) = raw.get("includes").and_then(Value::as_object) {
            for include in includes.values().filter_map(Value::as_array).flatten() {
                self.check_space(include)?;
            }
        }
        Ok(())
    }

    /// Loads the space and indexed content types from the durable tier.
    fn warm_up(&self) -> usize {
        let builder = ResourceBuilder::new(self);
        let mut loaded = 0;
        for raw in self.repository.durable_documents() {
            match builder.build_resource(&raw) {
                Ok(_) => loaded += 1,
                Err(err) => warn!(error = %err, "skipping durable record during warm-up"),
            }
        }
        debug!(loaded, "warm-up finished");
        loaded
    }
}

/// Assembles a [`Client`]: transport, optional durable cache and entry models.
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    cache: Option<Box<dyn DurableCache>>,
    mappers: MapperRegistry,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        ClientBuilder {
            config,
            transport: Box::new(transport),
            cache: None,
            mappers: MapperRegistry::new(),
        }
    }

    /// Backs the repository with a durable tier for spaces and content types.
    pub fn durable_cache(mut self, cache: impl DurableCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    /// Hydrates entries of `content_type` into `T` as well.
    pub fn register_model<T: EntryModel>(mut self, content_type: impl Into<String>) -> Self {
        self.mappers.register::<T>(content_type);
        self
    }

    pub fn build(self) -> Result<Rc<Client>, Error> {
        let config = self.config;
        let repository = match self.cache {
            Some(cache) => InstanceRepository::with_durable_cache(
                cache,
                &config.space_id,
                &config.environment,
                config.cache.persist,
            ),
            None if config.cache.warm_up => {
                return Err(Error::MisconfiguredCache(
                    "warm-up requested without a durable cache".to_string(),
                ));
            }
            None => InstanceRepository::new(),
        };
        repository.probe()?;

        let transport = self.transport;
        let mappers = self.mappers;
        let client = Rc::new_cyclic(|this| Client {
            config,
            transport,
            repository,
            mappers,
            this: this.clone(),
        });
        if client.config.cache.warm_up {
            client.warm_up();
        }
        Ok(client)
    }
}
