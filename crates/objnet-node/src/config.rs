use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use objnet_store::{FileObjectStore, InMemoryObjectStore, ObjectManager, ObjectStore};
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, NodeResult};

pub const DEFAULT_PORT: u16 = 18018;

/// Node settings, loadable from a TOML file. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Sent in our `hello`.
    pub agent: String,
    pub find_timeout_ms: u64,
    /// Longest unterminated line a session buffers before discarding it.
    pub max_message_size: usize,
    /// Directory for durable objects; in-memory storage when unset.
    pub db_path: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            agent: format!("objnet/{}", env!("CARGO_PKG_VERSION")),
            find_timeout_ms: objnet_store::DEFAULT_FIND_TIMEOUT.as_millis() as u64,
            max_message_size: objnet_protocol::MAX_MESSAGE_SIZE,
            db_path: None,
        }
    }
}

impl NodeConfig {
    pub fn from_toml_str(s: &str) -> NodeResult<Self> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> NodeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_timeout_ms)
    }

    /// Build the object manager this configuration describes.
    pub fn build_manager(&self) -> NodeResult<ObjectManager> {
        let backend: Arc<dyn ObjectStore> = match &self.db_path {
            Some(path) => Arc::new(FileObjectStore::open(path)?),
            None => Arc::new(InMemoryObjectStore::new()),
        };
        Ok(ObjectManager::with_timeout(backend, self.find_timeout()))
    }
}
