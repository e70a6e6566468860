use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use objnet_types::{NetworkObject, ObjectId};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryObjectStore;
use crate::traits::ObjectStore;

/// How long [`ObjectManager::find_object`] waits for a missing object.
pub const DEFAULT_FIND_TIMEOUT: Duration = Duration::from_millis(5000);

/// A caller blocked on the arrival of one object.
struct Waiter {
    token: u64,
    tx: oneshot::Sender<NetworkObject>,
}

/// Content-addressed store plus resolution broker for missing objects.
///
/// Wraps a durable [`ObjectStore`] backend and a map of pending waiters.
/// One manager is shared (via `Arc`) by every peer session of a node.
///
/// [`put`](Self::put) writes to the backend before taking the waiter lock to
/// drain, and [`find_object`](Self::find_object) holds that lock across its
/// storage probe and waiter registration. A find therefore either sees the
/// object in storage or is registered before the `put` drains, never neither.
/// Backend writes never run under the waiter lock, so a slow disk stalls only
/// the thread doing the `put`, not other sessions' finds.
pub struct ObjectManager {
    backend: Arc<dyn ObjectStore>,
    pending: Mutex<HashMap<ObjectId, Vec<Waiter>>>,
    next_token: AtomicU64,
    find_timeout: Duration,
}

impl ObjectManager {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self::with_timeout(backend, DEFAULT_FIND_TIMEOUT)
    }

    pub fn with_timeout(backend: Arc<dyn ObjectStore>, find_timeout: Duration) -> Self {
        Self {
            backend,
            pending: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(0),
            find_timeout,
        }
    }

    /// A manager over a fresh [`InMemoryObjectStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryObjectStore::new()))
    }

    pub fn find_timeout(&self) -> Duration {
        self.find_timeout
    }

    /// Compute the content-addressed id of `object`.
    pub fn compute_id(&self, object: &NetworkObject) -> StoreResult<ObjectId> {
        Ok(object.id()?)
    }

    /// Whether `id` is in durable storage. Pending waiters are not considered.
    pub fn has(&self, id: &ObjectId) -> StoreResult<bool> {
        self.backend.exists(id)
    }

    /// Fetch `id` from durable storage.
    pub fn get(&self, id: &ObjectId) -> StoreResult<NetworkObject> {
        self.backend.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Commit `object` and wake every waiter registered for its id.
    ///
    /// No dependency checking happens here; callers commit in dependency
    /// order. Storing an object twice returns the same id, and the second
    /// call finds no waiters left to wake.
    pub fn put(&self, object: &NetworkObject) -> StoreResult<ObjectId> {
        let id = self.compute_id(object)?;
        self.backend.write(id, object)?;
        let waiters = self
            .pending
            .lock()
            .expect("lock poisoned")
            .remove(&id)
            .unwrap_or_default();
        if !waiters.is_empty() {
            debug!(id = %id.short_hex(), waiters = waiters.len(), "resolving pending finds");
        }
        for waiter in waiters {
            // The receiver may already be gone if its find was dropped.
            let _ = waiter.tx.send(object.clone());
        }
        Ok(id)
    }

    /// Resolve `id` locally, or wait for it to be committed.
    ///
    /// On a local miss a waiter is registered first and then `on_miss` is
    /// called once with `id` (typically to send `getobject` to a peer). The
    /// call then waits until a [`put`](Self::put) of that object wakes it, or
    /// fails with [`StoreError::ResolutionTimeout`] once the find timeout
    /// elapses. The timer is fixed at the start of the wait and is not
    /// extended by other activity. Dropping the returned future early
    /// deregisters the waiter.
    pub async fn find_object<F>(&self, id: ObjectId, on_miss: F) -> StoreResult<NetworkObject>
    where
        F: FnOnce(ObjectId),
    {
        let (token, mut rx) = {
            let mut pending = self.pending.lock().expect("lock poisoned");
            if let Some(object) = self.backend.read(&id)? {
                return Ok(object);
            }
            let (tx, rx) = oneshot::channel();
            let token = self.next_token.fetch_add(1, Ordering::Relaxed);
            pending.entry(id).or_default().push(Waiter { token, tx });
            (token, rx)
        };
        let mut guard = PendingGuard {
            manager: self,
            id,
            token,
            armed: true,
        };

        trace!(id = %id.short_hex(), token, "object missing locally, waiting");
        on_miss(id);

        let outcome = tokio::time::timeout(self.find_timeout, &mut rx).await;
        // Past this point the waiter is either claimed by a put or removed below.
        guard.armed = false;
        match outcome {
            Ok(Ok(object)) => Ok(object),
            Ok(Err(_)) => Err(StoreError::ResolutionTimeout(id)),
            Err(_) => {
                if self.remove_waiter(&id, token) {
                    debug!(id = %id.short_hex(), "find timed out");
                    return Err(StoreError::ResolutionTimeout(id));
                }
                // A put claimed this waiter before the timer could; its
                // delivery is already on the way.
                rx.await.map_err(|_| StoreError::ResolutionTimeout(id))
            }
        }
    }

    /// Number of finds currently waiting, across all ids.
    pub fn pending_count(&self) -> usize {
        let pending = self.pending.lock().expect("lock poisoned");
        pending.values().map(Vec::len).sum()
    }

    /// Remove the waiter with `token`; `false` if it was already taken by a put.
    fn remove_waiter(&self, id: &ObjectId, token: u64) -> bool {
        let mut pending = self.pending.lock().expect("lock poisoned");
        let Some(waiters) = pending.get_mut(id) else {
            return false;
        };
        let before = waiters.len();
        waiters.retain(|w| w.token != token);
        let removed = waiters.len() != before;
        if waiters.is_empty() {
            pending.remove(id);
        }
        removed
    }
}

/// Deregisters a find's waiter if the find is dropped while still waiting.
struct PendingGuard<'a> {
    manager: &'a ObjectManager,
    id: ObjectId,
    token: u64,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.manager.remove_waiter(&self.id, self.token) {
            trace!(id = %self.id.short_hex(), token = self.token, "find cancelled");
        }
    }
}

impl std::fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("pending", &self.pending_count())
            .field("find_timeout", &self.find_timeout)
            .finish()
    }
}
