use serde::{Deserialize, Serialize};

use crate::canonical::to_canonical_vec;
use crate::error::TypeResult;
use crate::object::ObjectId;

/// An immutable object exchanged between peers.
///
/// Identity is derived, not stored: the [`ObjectId`] is the BLAKE3 hash of
/// the canonical JSON encoding of `{ "deps": [...], "name": ... }`. Two
/// objects with the same name and dependency list are the same object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkObject {
    name: String,
    deps: Vec<ObjectId>,
}

impl NetworkObject {
    pub fn new(name: impl Into<String>, deps: Vec<ObjectId>) -> Self {
        Self {
            name: name.into(),
            deps,
        }
    }

    /// An object with no dependencies.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dependency ids, in declaration order.
    pub fn deps(&self) -> &[ObjectId] {
        &self.deps
    }

    /// The canonical bytes this object hashes over.
    pub fn canonical_bytes(&self) -> TypeResult<Vec<u8>> {
        to_canonical_vec(self)
    }

    /// Compute the content-addressed id of this object.
    pub fn id(&self) -> TypeResult<ObjectId> {
        Ok(ObjectId::from_bytes(&self.canonical_bytes()?))
    }
}
