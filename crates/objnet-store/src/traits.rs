use objnet_types::{NetworkObject, ObjectId};

use crate::error::StoreResult;

/// Durable key-value storage for network objects, keyed by object id.
///
/// Backends are plain storage: they never compute ids, check dependencies,
/// or know about pending finds. That is the job of
/// [`ObjectManager`](crate::ObjectManager), which wraps a backend.
///
/// Implementations must be idempotent under repeated writes of the same
/// `(id, object)` pair and must propagate all I/O errors.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id. Returns `Ok(None)` if it does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<NetworkObject>>;

    /// Write an object under `id`. Overwriting identical content is a no-op.
    fn write(&self, id: ObjectId, object: &NetworkObject) -> StoreResult<()>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;
}
