//! Content-addressed object storage for objnet.
//!
//! Every [`NetworkObject`](objnet_types::NetworkObject) is stored under the
//! BLAKE3 hash of its canonical encoding. The store is also the rendezvous
//! point for dependency resolution: a caller that needs an object the node
//! does not hold yet registers a waiter with [`ObjectManager::find_object`]
//! and is woken by the [`ObjectManager::put`] that eventually commits it.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileObjectStore`] -- one canonical JSON file per object on disk
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. `put` is the single commit point; it writes, then drains waiters under
//!    the same lock a find holds while probing, so no waiter can miss its wakeup.
//! 3. Every pending find is bounded by its own timer.
//! 4. The store never checks dependencies -- callers commit in dependency order.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod manager;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use file::FileObjectStore;
pub use manager::{ObjectManager, DEFAULT_FIND_TIMEOUT};
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
