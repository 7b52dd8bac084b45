use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::services::registry::ConnectionId;

/// Frames a connection may have queued before new ones are dropped for it.
pub const OUTBOX_CAPACITY: usize = 64;

/// Per-connection outbound queue, drained by that connection's socket task.
pub type Outbox = mpsc::Sender<String>;

pub fn outbox() -> (Outbox, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// A transport endpoint the publisher can fan a frame out through.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Queues `message` on every open connection and returns how many took it.
    async fn deliver(&self, message: &str) -> usize;

    async fn open_connections(&self) -> usize;
}

/// The connections accepted on one listener.
#[derive(Debug)]
pub struct EndpointSink {
    name: String,
    connections: RwLock<HashMap<ConnectionId, Outbox>>,
}

impl EndpointSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn attach(&self, connection: ConnectionId, outbox: Outbox) {
        self.connections.write().await.insert(connection, outbox);
    }

    pub async fn detach(&self, connection: ConnectionId) -> bool {
        self.connections.write().await.remove(&connection).is_some()
    }
}

#[async_trait]
impl Sink for EndpointSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, message: &str) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for (connection, outbox) in connections.iter() {
            if outbox.is_closed() {
                debug!("Skipping closed connection {} on {}", connection, self.name);
                continue;
            }
            match outbox.try_send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Dropping frame for stalled connection {} on {}", connection, self.name);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Connection {} on {} closed mid-delivery", connection, self.name);
                }
            }
        }
        delivered
    }

    async fn open_connections(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|outbox| !outbox.is_closed())
            .count()
    }
}

/// Fans frames out across every registered sink.
#[derive(Default, Clone)]
pub struct Publisher {
    sinks: Vec<Arc<dyn Sink>>,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub async fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        for sink in &self.sinks {
            let count = sink.deliver(message).await;
            debug!("Delivered frame to {} connection(s) on {}", count, sink.name());
            delivered += count;
        }
        delivered
    }

    pub async fn open_connections(&self) -> usize {
        let mut total = 0;
        for sink in &self.sinks {
            total += sink.open_connections().await;
        }
        total
    }
}
