use crate::error::{EmberError, Result};
use crate::storage::{ColdStore, HotStore, validate_collection_id};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Two-tier storage engine.
///
/// Every key operation enters here. The engine resolves which tier a
/// collection lives in, lazily materializes cold collections into the hot
/// tier on first touch, and delegates the actual read or write to the hot
/// tier. The cold tier is only touched on a miss, on flush, or when listing
/// or checking existence.
pub struct Engine {
    hot: HotStore,
    cold: ColdStore,
    auto_create_collection: bool,
    // One lock per collection id. Keyed operations on the same collection are
    // serialized, so a flush can never interleave with an in-flight write and
    // concurrent first-touches converge on a single load-or-create.
    collection_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Engine {
    /// Opens an engine over `data_dir`, creating the directory if needed.
    ///
    /// With `auto_create_collection` set, a write against an unknown
    /// collection id creates it in the hot tier; otherwise such a write fails
    /// with a not-found error.
    pub fn new<P: AsRef<Path>>(data_dir: P, auto_create_collection: bool) -> Result<Self> {
        Ok(Self {
            hot: HotStore::new(),
            cold: ColdStore::new(data_dir)?,
            auto_create_collection,
            collection_locks: DashMap::new(),
        })
    }

    /// Distinct collection ids across both tiers, each exactly once.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut ids: HashSet<String> = self.hot.list_collections().into_iter().collect();
        ids.extend(self.cold.list_collections()?);

        Ok(ids.into_iter().collect())
    }

    /// True if the collection is resident in either tier.
    pub fn collection_exists(&self, id: &str) -> Result<bool> {
        validate_collection_id(id)?;

        // hot first: the cold check costs filesystem io
        if self.hot.collection_exists(id) {
            return Ok(true);
        }
        self.cold.collection_exists(id)
    }

    /// Reports hot-tier membership; a collection absent from both tiers is an
    /// error rather than `false`.
    pub fn is_hot(&self, id: &str) -> Result<bool> {
        if self.collection_exists(id)? {
            Ok(self.hot.collection_exists(id))
        } else {
            Err(EmberError::CollectionNotFound(id.to_string()))
        }
    }

    /// Ensures the collection is resident in the hot tier: a no-op if already
    /// hot, a cold load if persisted, an empty create if auto-create is
    /// enabled, and a not-found error otherwise.
    ///
    /// Runs under the collection's lock: callers racing on the same absent id
    /// converge on one load-or-create and all observe its result.
    pub fn load_if_absent(&self, id: &str) -> Result<()> {
        validate_collection_id(id)?;
        let lock = self.collection_lock(id);
        let _guard = lock.lock();

        self.materialize(id)
    }

    /// Reads a key, transparently loading the collection from the cold tier
    /// first when necessary.
    ///
    /// Reads never auto-create: a read against a wholly absent collection is
    /// not-found regardless of the auto-create flag.
    pub fn read_key(&self, id: &str, key: &str) -> Result<String> {
        validate_collection_id(id)?;
        let lock = self.collection_lock(id);
        let _guard = lock.lock();

        if !self.hot.collection_exists(id) {
            if !self.cold.collection_exists(id)? {
                return Err(EmberError::CollectionNotFound(id.to_string()));
            }
            self.load_collection(id)?;
        }

        self.hot.read_key(id, key)
    }

    /// Writes a key, materializing the collection first (auto-create
    /// applies).
    pub fn write_key(&self, id: &str, key: &str, value: &str) -> Result<()> {
        validate_collection_id(id)?;
        let lock = self.collection_lock(id);
        let _guard = lock.lock();

        self.materialize(id)?;
        self.hot.write_key(id, key, value)
    }

    /// Durably persists a hot collection and evicts it from the hot tier.
    ///
    /// Persist-then-evict: if the cold write fails the resident copy stays in
    /// place and no data is lost.
    pub fn flush(&self, id: &str) -> Result<()> {
        validate_collection_id(id)?;
        let lock = self.collection_lock(id);
        let _guard = lock.lock();

        if !self.hot.collection_exists(id) {
            return Err(EmberError::CollectionNotFound(id.to_string()));
        }

        let snapshot = self.hot.snapshot(id)?;
        self.cold.write(id, &snapshot)?;
        self.hot.drop_collection(id)?;

        Ok(())
    }

    /// Attempts to flush every currently hot collection, collecting failures
    /// instead of aborting on the first.
    ///
    /// Called at shutdown; any returned error means that collection's state
    /// is still unpersisted.
    pub fn flush_all(&self) -> Vec<EmberError> {
        let mut errors = Vec::new();
        for id in self.hot.list_collections() {
            if let Err(e) = self.flush(&id) {
                errors.push(e);
            }
        }

        errors
    }

    // Caller must hold the collection lock for `id`.
    fn materialize(&self, id: &str) -> Result<()> {
        if self.hot.collection_exists(id) {
            return Ok(());
        }

        if self.cold.collection_exists(id)? {
            return self.load_collection(id);
        }

        if self.auto_create_collection {
            tracing::info!(collection = id, "creating collection in hot storage");
            return self.hot.create_collection(id);
        }

        Err(EmberError::CollectionNotFound(id.to_string()))
    }

    // Caller must hold the collection lock for `id`.
    fn load_collection(&self, id: &str) -> Result<()> {
        let collection = self.cold.read(id)?;
        self.hot.insert_collection(id, collection);

        Ok(())
    }

    fn collection_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.collection_locks
            .entry(id.to_string())
            .or_insert_with(Default::default)
            .value()
            .clone()
    }
}
