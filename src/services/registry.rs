use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

pub type ConnectionId = u64;

/// Which identity last joined through each live connection.
///
/// An identity is tracked on at most one connection: joining from a new
/// connection moves it there.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    identities: RwLock<HashMap<ConnectionId, String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: ConnectionId, identity: &str) {
        let mut identities = self.identities.write().await;
        identities.retain(|&other, name| other == connection || name != identity);
        identities.insert(connection, identity.to_string());
    }

    pub async fn unregister(&self, connection: ConnectionId) -> Option<String> {
        self.identities.write().await.remove(&connection)
    }

    pub async fn identity_of(&self, connection: ConnectionId) -> Option<String> {
        self.identities.read().await.get(&connection).cloned()
    }

    pub async fn connected_identities(&self) -> HashSet<String> {
        self.identities.read().await.values().cloned().collect()
    }
}
