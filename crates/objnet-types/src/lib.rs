//! Foundation types for objnet.
//!
//! Every other objnet crate depends on `objnet-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash, hex on the wire)
//! - [`NetworkObject`]: Immutable `{ name, deps }` object exchanged between peers
//! - [`canonical`]: Deterministic, key-order-independent JSON encoding

pub mod canonical;
pub mod error;
pub mod network;
pub mod object;

pub use canonical::{to_canonical_string, to_canonical_vec};
pub use error::{TypeError, TypeResult};
pub use network::NetworkObject;
pub use object::ObjectId;
