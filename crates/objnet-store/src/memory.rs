use std::collections::HashMap;
use std::sync::RwLock;

use objnet_types::{NetworkObject, ObjectId};

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests, clients, and nodes run without a data directory.
/// Objects are held behind a `RwLock` and cloned on read.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, NetworkObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<NetworkObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, id: ObjectId, object: &NetworkObject) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        // Same id always maps to the same content.
        map.entry(id).or_insert_with(|| object.clone());
        Ok(())
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(store: &InMemoryObjectStore, obj: &NetworkObject) -> ObjectId {
        let id = obj.id().unwrap();
        store.write(id, obj).unwrap();
        id
    }

    #[test]
    fn write_and_read() {
        let store = InMemoryObjectStore::new();
        let obj = NetworkObject::leaf("alpha");
        let id = stored(&store, &obj);
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn read_missing_object_returns_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::from_bytes(b"missing")).unwrap().is_none());
    }

    #[test]
    fn exists_tracks_writes() {
        let store = InMemoryObjectStore::new();
        let obj = NetworkObject::leaf("present");
        let id = obj.id().unwrap();
        assert!(!store.exists(&id).unwrap());
        store.write(id, &obj).unwrap();
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = NetworkObject::leaf("idempotent");
        let id1 = stored(&store, &obj);
        let id2 = stored(&store, &obj);
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = stored(&store, &NetworkObject::leaf("shared"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let obj = store.read(&id).unwrap().expect("should exist");
                    assert_eq!(obj.id().unwrap(), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::default();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }
}
