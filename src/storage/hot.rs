use crate::error::{EmberError, Result};
use crate::storage::Collection;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory tier: a registry of currently loaded collections.
///
/// The registry is sharded, so registering or dropping one collection does not
/// serialize key traffic on unrelated collections.
pub struct HotStore {
    collections: DashMap<String, Collection>,
}

impl HotStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    pub fn list_collections(&self) -> Vec<String> {
        self.collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn collection_exists(&self, id: &str) -> bool {
        self.collections.contains_key(id)
    }

    /// Reads a single key; a missing collection and a missing key fail with
    /// distinct error kinds.
    pub fn read_key(&self, id: &str, key: &str) -> Result<String> {
        let collection = self
            .collections
            .get(id)
            .ok_or_else(|| EmberError::CollectionNotFound(id.to_string()))?;

        collection
            .get(key)
            .cloned()
            .ok_or_else(|| EmberError::KeyNotFound {
                collection: id.to_string(),
                key: key.to_string(),
            })
    }

    /// Upserts a key into a resident collection.
    pub fn write_key(&self, id: &str, key: &str, value: &str) -> Result<()> {
        let mut collection = self
            .collections
            .get_mut(id)
            .ok_or_else(|| EmberError::CollectionNotFound(id.to_string()))?;

        collection.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Registers an empty collection; check-and-insert is atomic per shard.
    pub fn create_collection(&self, id: &str) -> Result<()> {
        match self.collections.entry(id.to_string()) {
            Entry::Occupied(_) => Err(EmberError::CollectionAlreadyExists(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Collection::new());
                Ok(())
            }
        }
    }

    /// Registers a fully materialized collection, replacing any resident copy.
    pub fn insert_collection(&self, id: &str, collection: Collection) {
        self.collections.insert(id.to_string(), collection);
    }

    /// Clone of the current contents. Flush persists this before evicting so
    /// the resident copy survives a failed persist.
    pub fn snapshot(&self, id: &str) -> Result<Collection> {
        self.collections
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EmberError::CollectionNotFound(id.to_string()))
    }

    /// Removes a collection from the registry and returns its contents.
    pub fn drop_collection(&self, id: &str) -> Result<Collection> {
        self.collections
            .remove(id)
            .map(|(_, collection)| collection)
            .ok_or_else(|| EmberError::CollectionNotFound(id.to_string()))
    }
}

impl Default for HotStore {
    fn default() -> Self {
        Self::new()
    }
}
