use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use objnet_types::{to_canonical_vec, NetworkObject, ObjectId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Directory-backed object store.
///
/// Each object lives in `<root>/<id hex>.json` as canonical JSON. Writes go
/// through a temporary file in the same directory followed by an atomic
/// rename, so a crash never leaves a half-written object behind. Reads
/// re-hash the content and reject files whose hash does not match their name.
///
/// All calls are blocking file I/O and each write ends in an `fsync`. They
/// run on the calling thread; [`ObjectManager`](crate::ObjectManager) never
/// holds its waiter lock across a backend write.
#[derive(Debug)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, id: &ObjectId) -> PathBuf {
        self.root.join(format!("{}.json", id.to_hex()))
    }
}

impl ObjectStore for FileObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<NetworkObject>> {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object: NetworkObject =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let computed = object.id()?;
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, id: ObjectId, object: &NetworkObject) -> StoreResult<()> {
        let path = self.path_for(&id);
        if path.exists() {
            return Ok(());
        }
        let bytes = to_canonical_vec(object)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(id = %id.short_hex(), path = %path.display(), "object written to disk");
        Ok(())
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.path_for(id).try_exists()?)
    }
}
