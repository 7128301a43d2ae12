use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::DurableCache;
use crate::error::Error;
use crate::key::{IdentityKey, ResourceKind};
use crate::resource::Resource;

/// Identity cache mapping each [`IdentityKey`] to its one live resource.
///
/// Responsibilities:
/// - Identity: a key always maps to the instance first registered for it
/// - Durable write-through of Space and ContentType, when a durable tier is set
///
/// The in-memory tier is always consulted first and never evicts. Entries
/// and assets never reach the durable tier. Durable failures are logged and
/// treated as misses.
pub struct InstanceRepository {
    resources: RefCell<HashMap<IdentityKey, Resource>>,
    journal: RefCell<Journal>,
    durable: Option<DurableTier>,
}

/// Entries and assets first registered while a model hydration is running.
/// Spaces and content types never point at entries and are not journaled.
#[derive(Default)]
struct Journal {
    depth: usize,
    keys: Vec<IdentityKey>,
}

/// Position in the journal a failed hydration rolls back to.
pub(crate) struct Checkpoint(usize);

struct DurableTier {
    cache: Box<dyn DurableCache>,
    namespace: String,
    space_id: String,
    persist: bool,
}

impl InstanceRepository {
    /// Creates a memory-only repository.
    pub fn new() -> Self {
        InstanceRepository {
            resources: RefCell::new(HashMap::new()),
            journal: RefCell::new(Journal::default()),
            durable: None,
        }
    }

    /// Creates a repository backed by a durable tier scoped to one space and
    /// environment. Built Space/ContentType resources are written through
    /// when `persist` is set.
    pub fn with_durable_cache(
        cache: Box<dyn DurableCache>,
        space_id: &str,
        environment: &str,
        persist: bool,
    ) -> Self {
        InstanceRepository {
            resources: RefCell::new(HashMap::new()),
            journal: RefCell::new(Journal::default()),
            durable: Some(DurableTier {
                cache,
                namespace: format!("hydrazine.{space_id}.{environment}"),
                space_id: space_id.to_string(),
                persist,
            }),
        }
    }

    pub fn has(&self, key: &IdentityKey) -> bool {
        self.resources.borrow().contains_key(key)
    }

    pub fn find(&self, key: &IdentityKey) -> Option<Resource> {
        self.resources.borrow().get(key).cloned()
    }

    pub fn get(&self, key: &IdentityKey) -> Result<Resource, Error> {
        self.find(key).ok_or_else(|| Error::NotFound {
            kind: key.kind(),
            id: key.id().to_string(),
        })
    }

    /// Registers a resource under its identity key. Last write wins.
    pub fn set(&self, resource: Resource) {
        let key = resource.identity_key();
        if let Some(tier) = &self.durable {
            if tier.persist && key.kind().is_durable() {
                tier.store(&key, &resource);
            }
        }
        debug!(%key, "registered");
        let journaled = !key.kind().is_durable();
        let previous = self.resources.borrow_mut().insert(key.clone(), resource);
        if previous.is_none() && journaled {
            let mut journal = self.journal.borrow_mut();
            if journal.depth > 0 {
                journal.keys.push(key);
            }
        }
    }

    pub(crate) fn remove(&self, key: &IdentityKey) -> Option<Resource> {
        self.resources.borrow_mut().remove(key)
    }

    /// Starts recording registrations. Checkpoints nest.
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        let mut journal = self.journal.borrow_mut();
        journal.depth += 1;
        Checkpoint(journal.keys.len())
    }

    /// Keeps everything registered since `checkpoint`.
    pub(crate) fn commit(&self, _checkpoint: Checkpoint) {
        let mut journal = self.journal.borrow_mut();
        journal.depth -= 1;
        if journal.depth == 0 {
            journal.keys.clear();
        }
    }

    /// Unregisters every entry and asset registered since `checkpoint`.
    pub(crate) fn rollback(&self, checkpoint: Checkpoint) {
        let keys = {
            let mut journal = self.journal.borrow_mut();
            journal.depth -= 1;
            let keys = journal.keys.split_off(checkpoint.0);
            if journal.depth == 0 {
                journal.keys.clear();
            }
            keys
        };
        for key in keys {
            debug!(%key, "rolled back");
            self.remove(&key);
        }
    }

    /// Returns the number of live resources.
    pub fn len(&self) -> usize {
        self.resources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.borrow().is_empty()
    }

    pub fn has_durable_tier(&self) -> bool {
        self.durable.is_some()
    }

    /// Checks once that the durable tier answers at all.
    pub(crate) fn probe(&self) -> Result<(), Error> {
        if let Some(tier) = &self.durable {
            tier.cache
                .has(&tier.index_key())
                .map_err(|err| Error::MisconfiguredCache(err.to_string()))?;
        }
        Ok(())
    }

    /// Reads the durable record of a Space or ContentType.
    pub(crate) fn load_durable(&self, key: &IdentityKey) -> Option<Value> {
        let tier = self.durable.as_ref()?;
        if !key.kind().is_durable() {
            return None;
        }
        tier.load(&tier.key(key))
    }

    /// Writes a Space or ContentType to the durable tier regardless of the
    /// write-through setting. Returns false if nothing was written.
    pub(crate) fn store_durable(&self, resource: &Resource) -> bool {
        let key = resource.identity_key();
        match &self.durable {
            Some(tier) if key.kind().is_durable() => tier.store(&key, resource),
            _ => false,
        }
    }

    /// Every record warm-up should load: the space first, then each indexed
    /// content type.
    pub(crate) fn durable_documents(&self) -> Vec<Value> {
        let Some(tier) = &self.durable else {
            return Vec::new();
        };
        let mut documents: Vec<Value> = Vec::new();
        documents.extend(tier.load::<Value>(&tier.key(&IdentityKey::space(tier.space_id.as_str()))));
        for id in tier.content_type_index() {
            documents.extend(tier.load::<Value>(&tier.key(&IdentityKey::content_type(id))));
        }
        documents
    }
}

impl Default for InstanceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableTier {
    fn key(&self, key: &IdentityKey) -> String {
        key.durable_key(&self.namespace)
    }

    fn index_key(&self) -> String {
        format!("{}.content_types", self.namespace)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.cache.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "durable read failed, treating as miss");
                return None;
            }
        };
        match ciborium::from_reader(bytes.as_slice()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "undecodable durable record, treating as miss");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let mut bytes = Vec::new();
        if let Err(err) = ciborium::into_writer(value, &mut bytes) {
            warn!(key, error = %err, "cannot encode durable record");
            return false;
        }
        match self.cache.set(key, &bytes) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "durable write failed");
                false
            }
        }
    }

    fn content_type_index(&self) -> Vec<String> {
        self.load(&self.index_key()).unwrap_or_default()
    }

    fn store(&self, key: &IdentityKey, resource: &Resource) -> bool {
        if !self.write(&self.key(key), &resource.to_json()) {
            return false;
        }
        if key.kind() == ResourceKind::ContentType {
            let mut index = self.content_type_index();
            if !index.iter().any(|id| id == key.id()) {
                index.push(key.id().to_string());
                return self.write(&self.index_key(), &index);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::CacheError;
    use crate::locale::Locale;
    use crate::resource::{ContentType, DeletedResource, Space};
    use crate::sys::SystemProperties;
    use std::rc::Rc;
    use std::sync::Arc;

    fn space(id: &str) -> Resource {
        let mut space = Space::new(SystemProperties::new(id, ResourceKind::Space));
        space.name = "Example".to_string();
        space.locales = vec![Locale {
            code: "en-US".to_string(),
            name: "English".to_string(),
            default: true,
            fallback_code: None,
            optional: false,
        }];
        Resource::Space(Rc::new(space))
    }

    fn content_type(id: &str) -> Resource {
        let mut content_type = ContentType::new(SystemProperties::new(id, ResourceKind::ContentType));
        content_type.name = id.to_string();
        Resource::ContentType(Rc::new(content_type))
    }

    #[test]
    fn set_and_get_same_instance() {
        let repository = InstanceRepository::new();
        let resource = space("cfexampleapi");
        repository.set(resource.clone());

        let key = IdentityKey::space("cfexampleapi");
        assert!(repository.has(&key));
        assert!(repository.get(&key).unwrap().ptr_eq(&resource));
        assert_eq!(repository.len(), 1);
    }

    fn deleted(id: &str) -> Resource {
        Resource::DeletedEntry(Rc::new(DeletedResource {
            sys: SystemProperties::new(id, ResourceKind::DeletedEntry),
        }))
    }

    #[test]
    fn rollback_unregisters_everything_since_checkpoint() {
        let repository = InstanceRepository::new();
        repository.set(deleted("before"));

        let outer = repository.checkpoint();
        repository.set(deleted("a"));
        let inner = repository.checkpoint();
        repository.set(deleted("b"));
        repository.set(space("s"));
        repository.commit(inner);
        repository.rollback(outer);

        let key = |id: &str| IdentityKey::new(ResourceKind::DeletedEntry, id, None);
        assert!(repository.has(&key("before")));
        assert!(!repository.has(&key("a")));
        assert!(!repository.has(&key("b")));
        assert!(repository.has(&IdentityKey::space("s")));
    }

    #[test]
    fn committed_registrations_stay() {
        let repository = InstanceRepository::new();
        let checkpoint = repository.checkpoint();
        repository.set(deleted("a"));
        repository.commit(checkpoint);

        let later = repository.checkpoint();
        repository.rollback(later);

        assert!(repository.has(&IdentityKey::new(ResourceKind::DeletedEntry, "a", None)));
    }

    #[test]
    fn get_missing_is_not_found() {
        let repository = InstanceRepository::new();
        let key = IdentityKey::entry("nyancat", "en-US");
        assert!(matches!(
            repository.get(&key),
            Err(Error::NotFound { kind: ResourceKind::Entry, .. })
        ));
    }

    #[test]
    fn write_through_indexes_content_types() {
        let cache = Arc::new(MemoryCache::new());
        let repository =
            InstanceRepository::with_durable_cache(Box::new(Arc::clone(&cache)), "s", "master", true);

        repository.set(space("s"));
        repository.set(content_type("cat"));
        repository.set(content_type("dog"));
        repository.set(content_type("cat"));

        assert!(cache.has("hydrazine.s.master.space.s").unwrap());
        assert!(cache.has("hydrazine.s.master.content_type.cat").unwrap());

        let documents = repository.durable_documents();
        assert_eq!(documents.len(), 3);
        assert_eq!(documents[0]["sys"]["type"], "Space");
        assert_eq!(documents[1]["sys"]["id"], "cat");
        assert_eq!(documents[2]["sys"]["id"], "dog");
    }

    #[test]
    fn no_write_through_without_persist() {
        let cache = Arc::new(MemoryCache::new());
        let repository =
            InstanceRepository::with_durable_cache(Box::new(Arc::clone(&cache)), "s", "master", false);

        repository.set(space("s"));
        assert!(cache.is_empty());

        assert!(repository.store_durable(&space("s")));
        assert!(!cache.is_empty());
    }

    struct BrokenCache;

    impl DurableCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::new("disk on fire"))
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
            Err(CacheError::new("disk on fire"))
        }

        fn has(&self, _key: &str) -> Result<bool, CacheError> {
            Err(CacheError::new("disk on fire"))
        }
    }

    #[test]
    fn broken_durable_tier_fails_open() {
        let repository = InstanceRepository::with_durable_cache(Box::new(BrokenCache), "s", "master", true);

        repository.set(space("s"));

        assert!(repository.has(&IdentityKey::space("s")));
        assert!(repository.load_durable(&IdentityKey::space("s")).is_none());
        assert!(repository.durable_documents().is_empty());
        assert!(matches!(repository.probe(), Err(Error::MisconfiguredCache(_))));
    }

    #[test]
    fn undecodable_record_is_a_miss() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("hydrazine.s.master.space.s", b"\xff\xff not cbor").unwrap();
        let repository =
            InstanceRepository::with_durable_cache(Box::new(Arc::clone(&cache)), "s", "master", true);

        assert!(repository.load_durable(&IdentityKey::space("s")).is_none());
    }
}
