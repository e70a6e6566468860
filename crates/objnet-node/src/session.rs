//! Per-connection protocol state machine.
//!
//! A [`Session`] owns one side of a connection. Its read loop frames the
//! incoming byte stream into lines, decodes and validates each line, and
//! dispatches it. Outbound messages go through an unbounded queue drained by
//! a dedicated writer task, so handlers never block on the socket.
//!
//! Admission of an incoming `object` runs on its own task: its dependencies
//! are usually delivered over this same session, so the read loop must keep
//! running while admission waits.

use std::sync::Arc;

use objnet_protocol::{LineFramer, Message, MessageCodec, ProtocolError};
use objnet_store::{ObjectManager, StoreError};
use objnet_types::{NetworkObject, ObjectId};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};

const READ_CHUNK: usize = 8 * 1024;

/// Queue of messages waiting to be written to one peer.
#[derive(Clone, Debug)]
struct Outbox {
    tx: mpsc::UnboundedSender<Message>,
}

impl Outbox {
    /// Queue `msg`. Returns `false` once the connection's writer is gone;
    /// the message is then dropped.
    fn send(&self, msg: Message) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// Handle to one peer connection. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Session {
    peer: Arc<str>,
    manager: Arc<ObjectManager>,
    outbox: Outbox,
}

impl Session {
    /// Start the writer for `stream`, queue our `hello`, and hand back the
    /// session together with the read half for [`read_loop`](Self::read_loop).
    pub fn open<S>(
        stream: S,
        peer: impl Into<String>,
        manager: Arc<ObjectManager>,
        config: &NodeConfig,
    ) -> (Self, ReadHalf<S>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let peer: Arc<str> = Arc::from(peer.into());
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(writer, rx, peer.clone()));

        let session = Self {
            peer,
            manager,
            outbox: Outbox { tx },
        };
        session.send(Message::hello(config.agent.clone()));
        (session, reader)
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Queue a message for this peer; a no-op once the connection is gone.
    pub fn send(&self, msg: Message) {
        if !self.outbox.send(msg) {
            debug!(peer = %self.peer, "connection closed, dropping outbound message");
        }
    }

    /// Read until the peer closes the stream or the transport fails.
    pub async fn read_loop<R>(&self, mut reader: R, max_message_size: usize) -> NodeResult<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut framer = LineFramer::new(max_message_size);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    error!(peer = %self.peer, error = %e, "read failed");
                    return Err(e.into());
                }
            };
            for line in framer.push(&chunk[..n]) {
                match line {
                    Ok(text) => self.handle_line(&text),
                    Err(e) => self.reject(e),
                }
            }
        }
        info!(peer = %self.peer, "peer disconnected");
        Ok(())
    }

    fn handle_line(&self, line: &str) {
        match MessageCodec::decode(line) {
            Ok(msg) => {
                debug!(peer = %self.peer, kind = msg.type_name(), "received message");
                self.dispatch(msg);
            }
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, err: ProtocolError) {
        warn!(peer = %self.peer, error = %err, "dropping message");
        self.send(Message::error(err.to_string()));
    }

    fn dispatch(&self, msg: Message) {
        match msg {
            Message::Hello { agent } => {
                info!(peer = %self.peer, %agent, "hello");
            }
            Message::Text { text } => {
                info!(peer = %self.peer, %text, "text");
            }
            Message::GetObject { objectid } => self.handle_get_object(objectid),
            Message::Object { object } => {
                tokio::spawn(self.clone().admit(object));
            }
            Message::Error { description } => {
                warn!(peer = %self.peer, %description, "peer reported an error");
            }
        }
    }

    fn handle_get_object(&self, id: ObjectId) {
        match self.manager.get(&id) {
            Ok(object) => self.send(Message::object(object)),
            // The requester's own find will time out.
            Err(StoreError::NotFound(_)) => {
                debug!(peer = %self.peer, id = %id.short_hex(), "requested object unknown");
            }
            Err(e) => {
                error!(peer = %self.peer, id = %id.short_hex(), error = %e, "lookup failed");
            }
        }
    }

    async fn admit(self, object: NetworkObject) {
        match self.resolve_and_store(&object).await {
            Ok(id) => {
                info!(peer = %self.peer, id = %id, name = object.name(), "object stored");
            }
            Err(e) => {
                match &e {
                    NodeError::Store(store) if !store.is_recoverable() => {
                        error!(peer = %self.peer, name = object.name(), error = %e, "could not store object");
                    }
                    _ => warn!(peer = %self.peer, name = object.name(), error = %e, "object rejected"),
                }
                self.send(Message::error(format!(
                    "could not store object {:?}: {e}",
                    object.name()
                )));
            }
        }
    }

    /// Resolve every dependency of `object`, then commit it.
    ///
    /// All dependency lookups are started before any is awaited; each miss
    /// sends one `getobject` to this peer. The object is committed only if
    /// every lookup succeeds. On failure nothing is stored.
    pub async fn resolve_and_store(&self, object: &NetworkObject) -> NodeResult<ObjectId> {
        let mut finds = JoinSet::new();
        for dep in object.deps().iter().copied() {
            let manager = self.manager.clone();
            let outbox = self.outbox.clone();
            finds.spawn(async move {
                manager
                    .find_object(dep, move |missing| {
                        outbox.send(Message::get_object(missing));
                    })
                    .await
            });
        }

        let mut failure = None;
        while let Some(joined) = finds.join_next().await {
            let outcome = joined
                .map_err(|e| NodeError::Internal(e.to_string()))
                .and_then(|found| found.map_err(NodeError::from));
            if let Err(e) = outcome {
                failure.get_or_insert(e);
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        Ok(self.manager.put(object)?)
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Message>, peer: Arc<str>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let bytes = match MessageCodec::encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%peer, kind = msg.type_name(), error = %e, "could not encode message");
                continue;
            }
        };
        if let Err(e) = writer.write_all(&bytes).await {
            error!(%peer, error = %e, "write failed");
            break;
        }
        if let Err(e) = writer.flush().await {
            error!(%peer, error = %e, "flush failed");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

/// Drive one connection to completion.
pub async fn run_session<S>(
    stream: S,
    peer: impl Into<String>,
    manager: Arc<ObjectManager>,
    config: &NodeConfig,
) -> NodeResult<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (session, reader) = Session::open(stream, peer, manager, config);
    info!(peer = %session.peer(), "session opened");
    session.read_loop(reader, config.max_message_size).await
}
