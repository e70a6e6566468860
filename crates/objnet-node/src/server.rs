use std::net::SocketAddr;
use std::sync::Arc;

use objnet_protocol::Message;
use objnet_store::ObjectManager;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::NodeConfig;
use crate::error::NodeResult;
use crate::session::{run_session, Session};

/// objnet peer node: accepts connections and runs a session for each, all
/// sharing one [`ObjectManager`].
pub struct NodeServer {
    config: Arc<NodeConfig>,
    manager: Arc<ObjectManager>,
}

impl NodeServer {
    /// Build a node with the storage backend selected by `config`.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        let manager = Arc::new(config.build_manager()?);
        Ok(Self::with_manager(config, manager))
    }

    pub fn with_manager(config: NodeConfig, manager: Arc<ObjectManager>) -> Self {
        Self {
            config: Arc::new(config),
            manager,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<ObjectManager> {
        &self.manager
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn serve(self) -> NodeResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_listener(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve_listener(self, listener: TcpListener) -> NodeResult<()> {
        info!(addr = %listener.local_addr()?, agent = %self.config.agent, "objnet node listening");
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            info!(peer = %addr, "client connected");
            let manager = self.manager.clone();
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(e) = run_session(stream, addr.to_string(), manager, &config).await {
                    error!(peer = %addr, error = %e, "session ended with error");
                }
            });
        }
    }
}

/// An outbound session opened with [`connect`].
pub struct Connection {
    session: Session,
    reader: JoinHandle<NodeResult<()>>,
}

impl Connection {
    pub fn send(&self, msg: Message) {
        self.session.send(msg);
    }

    /// Whether the peer has closed its side.
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }

    /// Stop reading. Queued outbound messages are still flushed.
    pub fn close(self) {
        self.reader.abort();
    }
}

/// Open a session to the node at `addr`. The session answers `getobject`
/// requests and admits `object` messages exactly like an accepted one.
pub async fn connect(
    addr: SocketAddr,
    manager: Arc<ObjectManager>,
    config: Arc<NodeConfig>,
) -> NodeResult<Connection> {
    let stream = TcpStream::connect(addr).await?;
    info!(peer = %addr, "connected");
    let (session, reader_half) = Session::open(stream, addr.to_string(), manager, &config);
    let reader = {
        let session = session.clone();
        tokio::spawn(async move { session.read_loop(reader_half, config.max_message_size).await })
    };
    Ok(Connection { session, reader })
}
