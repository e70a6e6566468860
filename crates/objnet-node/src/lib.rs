//! objnet peer node.
//!
//! Runs the line-delimited object propagation protocol over TCP. Each
//! connection gets a [`Session`]; every session of a node shares one
//! [`ObjectManager`](objnet_store::ObjectManager), which is where incoming
//! objects wait for their dependencies to arrive.

pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use config::{NodeConfig, DEFAULT_PORT};
pub use error::{NodeError, NodeResult};
pub use server::{connect, Connection, NodeServer};
pub use session::{run_session, Session};
