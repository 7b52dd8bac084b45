use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::dto::{
    draft_dto::{DraftState, Phase, SharedDraftState},
    player_dto::Player,
};
use crate::services::{
    dispatcher::{self, Command},
    draft_machine::JoinOutcome,
    persistence::SnapshotFile,
    publisher::{EndpointSink, Outbox, Publisher},
    registry::{ConnectionId, ConnectionRegistry},
};

/// Answer to the bootstrap query from collaborating services.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub phase: Phase,
    pub participants: usize,
    pub connections: usize,
}

/// Owns the live draft and is the only path that mutates it.
///
/// Every mutation holds the state write lock from guard check through
/// snapshot and broadcast, so operations never interleave and every
/// connection sees frames in the order the mutations happened.
pub struct Coordinator {
    state: SharedDraftState,
    registry: ConnectionRegistry,
    publisher: Publisher,
    snapshot: SnapshotFile,
    admin_username: String,
    next_connection: AtomicU64,
}

impl Coordinator {
    /// Builds the coordinator and wipes any snapshot left by a previous run.
    pub async fn boot(
        admin_username: impl Into<String>,
        snapshot: SnapshotFile,
        publisher: Publisher,
    ) -> Arc<Self> {
        if let Err(e) = snapshot.reset().await {
            error!("Failed to reset draft snapshot: {}", e);
        } else {
            info!("Reset draft snapshot at {}.", snapshot.path().display());
        }

        Arc::new(Self {
            state: Arc::new(RwLock::new(DraftState::default())),
            registry: ConnectionRegistry::new(),
            publisher,
            snapshot,
            admin_username: admin_username.into(),
            next_connection: AtomicU64::new(1),
        })
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn current_state(&self) -> DraftState {
        self.state.read().await.clone()
    }

    pub async fn status(&self) -> CoordinatorStatus {
        let guard = self.state.read().await;
        CoordinatorStatus {
            phase: guard.phase(),
            participants: guard.participants().len(),
            connections: self.publisher.open_connections().await,
        }
    }

    /// Sends the new connection a full snapshot, then starts including it
    /// in broadcasts. Holding the read lock keeps a mutation from slipping
    /// in between the two.
    pub async fn connect(&self, endpoint: &EndpointSink, connection: ConnectionId, outbox: Outbox) {
        let guard = self.state.read().await;
        match dispatcher::encode_state(&guard) {
            Ok(frame) => {
                if let Err(e) = outbox.try_send(frame) {
                    debug!("Could not queue initial state for connection {}: {}", connection, e);
                }
            }
            Err(e) => error!("Failed to encode state for connection {}: {}", connection, e),
        }
        endpoint.attach(connection, outbox).await;
        info!("Connection {} opened.", connection);
    }

    /// Drops the connection from its endpoint and the registry. The
    /// participant, if any, keeps their place in the draft.
    pub async fn disconnect(&self, endpoint: &EndpointSink, connection: ConnectionId) {
        let guard = self.state.write().await;
        endpoint.detach(connection).await;
        let identity = self.registry.unregister(connection).await;
        info!(
            "Connection {} closed ({}).",
            connection,
            identity.as_deref().unwrap_or("anonymous")
        );
        self.broadcast_participants(&guard).await;
    }

    pub async fn handle_frame(&self, connection: ConnectionId, text: &str) {
        let command = match dispatcher::decode(text) {
            Ok(command) => command,
            Err(e) => {
                warn!("Dropping frame from connection {}: {}", connection, e);
                return;
            }
        };

        match command {
            Command::Join(data) => self.join(connection, &data.username).await,
            Command::StartDraft(data) => self.start_draft(&data.username).await,
            Command::DraftPlayer(data) => self.draft_player(&data.username, data.player).await,
            Command::Unknown(kind) => {
                warn!("Ignoring unknown message type {:?} from connection {}", kind, connection);
            }
        }
    }

    pub async fn join(&self, connection: ConnectionId, username: &str) {
        let mut guard = self.state.write().await;
        self.registry.register(connection, username).await;

        match guard.join(username) {
            JoinOutcome::Added => info!("{} joined the draft.", username),
            JoinOutcome::Rejoined => info!("{} rejoined the draft.", username),
        }

        self.persist(&guard).await;
        self.broadcast_participants(&guard).await;
    }

    pub async fn start_draft(&self, username: &str) {
        let mut guard = self.state.write().await;

        let outcome = {
            let mut rng = rand::rng();
            guard.start_draft(username, &self.admin_username, &mut rng)
        };
        if let Err(reason) = outcome {
            debug!("Ignoring startDraft from {}: {}", username, reason);
            return;
        }

        info!("Draft started. Order: {:?}", guard.draft_order());
        self.persist(&guard).await;
        self.broadcast_state(&guard).await;
    }

    pub async fn draft_player(&self, username: &str, player: Player) {
        let mut guard = self.state.write().await;

        match guard.draft_player(username, player, Utc::now()) {
            Ok(pick) => info!(
                "Pick {} (round {}): {} took {} into {:?}.",
                pick.pick_number,
                pick.round,
                pick.drafter,
                pick.player.name().unwrap_or("unnamed player"),
                pick.slot_filled
            ),
            Err(reason) => {
                debug!("Ignoring draftPlayer from {}: {}", username, reason);
                return;
            }
        }
        if let Some(roster) = guard.roster(username) {
            debug!("{} now has {} player(s) rostered.", username, roster.filled());
        }
        if guard.is_complete() {
            info!("Draft complete after {} picks.", guard.history().len());
        }

        self.persist(&guard).await;
        self.broadcast_state(&guard).await;
    }

    async fn persist(&self, state: &DraftState) {
        if let Err(e) = self.snapshot.save(state).await {
            error!("Failed to save draft state: {}", e);
        }
    }

    async fn broadcast_state(&self, state: &DraftState) {
        match dispatcher::encode_state(state) {
            Ok(frame) => {
                self.publisher.broadcast(&frame).await;
            }
            Err(e) => error!("Failed to serialize draft update message: {}", e),
        }
    }

    async fn broadcast_participants(&self, state: &DraftState) {
        let online = self.registry.connected_identities().await;
        let connected = state
            .participants()
            .iter()
            .filter(|p| online.contains(*p))
            .cloned()
            .collect();

        match dispatcher::encode_participants(state.participants(), connected) {
            Ok(frame) => {
                self.publisher.broadcast(&frame).await;
            }
            Err(e) => error!("Failed to serialize participant update: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::roster_dto::Slot;
    use serde_json::{Value, json};
    use crate::services::publisher::outbox;
    use tokio::sync::mpsc;

    struct Harness {
        coordinator: Arc<Coordinator>,
        endpoint: Arc<EndpointSink>,
        snapshot_path: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("draft_state.json");
        std::fs::write(&snapshot_path, b"{\"stale\": true}").unwrap();

        let endpoint = Arc::new(EndpointSink::new("plain"));
        let publisher = Publisher::new().with_sink(endpoint.clone());
        let coordinator =
            Coordinator::boot("shark", SnapshotFile::new(&snapshot_path), publisher).await;
        Harness {
            coordinator,
            endpoint,
            snapshot_path,
            _dir: dir,
        }
    }

    impl Harness {
        async fn open(&self) -> (ConnectionId, mpsc::Receiver<String>) {
            let (tx, rx) = outbox();
            let id = self.coordinator.next_connection_id();
            self.coordinator.connect(&self.endpoint, id, tx).await;
            (id, rx)
        }

        fn persisted(&self) -> DraftState {
            let raw = std::fs::read_to_string(&self.snapshot_path).unwrap();
            serde_json::from_str(&raw).unwrap()
        }
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    fn mid_player(name: &str) -> Player {
        serde_json::from_value(json!({ "id": name, "name": name, "position": "MID" })).unwrap()
    }

    #[tokio::test]
    async fn boot_resets_the_snapshot() {
        let h = harness().await;
        assert_eq!(h.persisted(), DraftState::default());
    }

    #[tokio::test]
    async fn new_connection_gets_full_state_first() {
        let h = harness().await;
        let (_, mut rx) = h.open().await;
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], json!("draftState"));
    }

    #[tokio::test]
    async fn join_broadcasts_participants_and_persists() {
        let h = harness().await;
        let (alice, mut rx) = h.open().await;
        drain(&mut rx);

        h.coordinator.handle_frame(alice, r#"{"type":"join","data":{"username":"alice"}}"#).await;

        let frames = drain(&mut rx);
        assert_eq!(
            frames,
            vec![json!({
                "type": "participantUpdate",
                "data": { "participants": ["alice"], "connected": ["alice"] }
            })]
        );
        assert_eq!(h.persisted().participants(), ["alice".to_string()]);
    }

    #[tokio::test]
    async fn shark_and_rival_scenario() {
        let h = harness().await;
        let (shark, mut shark_rx) = h.open().await;
        let (rival, _rival_rx) = h.open().await;
        h.coordinator.join(shark, "shark").await;
        h.coordinator.join(rival, "rival").await;

        h.coordinator.start_draft("shark").await;
        let started = h.coordinator.current_state().await;
        assert!(started.is_started());

        drain(&mut shark_rx);
        h.coordinator.start_draft("rival").await;
        assert!(drain(&mut shark_rx).is_empty());
        assert_eq!(h.coordinator.current_state().await, started);

        let first = started.draft_order()[0].clone();
        let second = started.draft_order()[1].clone();
        assert_eq!(started.current_drafter(), Some(first.as_str()));
        h.coordinator.draft_player(&first, mid_player("Faker")).await;

        let after = h.coordinator.current_state().await;
        let pick = after.history().last().unwrap();
        assert_eq!(pick.drafter, first);
        assert_eq!(pick.slot_filled, Slot::Mid);
        assert_eq!(pick.pick_number, 1);
        assert_eq!(after.current_drafter(), Some(second.as_str()));
        assert_eq!(h.persisted(), after);

        let frames = drain(&mut shark_rx);
        assert_eq!(frames.last().unwrap()["type"], json!("draftState"));
    }

    #[tokio::test]
    async fn rejected_actions_are_silent() {
        let h = harness().await;
        let (a, mut rx) = h.open().await;
        h.coordinator.join(a, "shark").await;
        drain(&mut rx);

        h.coordinator.start_draft("shark").await;
        h.coordinator.draft_player("shark", mid_player("early")).await;
        h.coordinator
            .handle_frame(a, r#"{"type":"resetDraft","data":{"username":"shark"}}"#)
            .await;
        h.coordinator.handle_frame(a, "{{{").await;

        assert!(drain(&mut rx).is_empty());
        assert!(!h.coordinator.current_state().await.is_started());
    }

    #[tokio::test]
    async fn reconnecting_keeps_roster_and_turn() {
        let h = harness().await;
        let (shark, _shark_rx) = h.open().await;
        let (alice, _alice_rx) = h.open().await;
        h.coordinator.join(shark, "shark").await;
        h.coordinator.join(alice, "alice").await;
        h.coordinator.start_draft("shark").await;

        let first = h.coordinator.current_state().await.draft_order()[0].clone();
        h.coordinator.draft_player(&first, mid_player("opener")).await;
        let before = h.coordinator.current_state().await;

        h.coordinator.disconnect(&h.endpoint, alice).await;
        let (again, mut again_rx) = h.open().await;
        h.coordinator.join(again, "alice").await;

        let after = h.coordinator.current_state().await;
        assert_eq!(after, before);
        assert!(after.draft_order().contains(&"alice".to_string()));
        assert_eq!(h.coordinator.registry.identity_of(again).await.as_deref(), Some("alice"));

        let frames = drain(&mut again_rx);
        assert_eq!(frames[0]["type"], json!("draftState"));
        assert_eq!(frames[0]["data"], serde_json::to_value(&before).unwrap());
    }

    #[tokio::test]
    async fn disconnect_broadcasts_who_is_still_online() {
        let h = harness().await;
        let (a, mut a_rx) = h.open().await;
        let (b, _b_rx) = h.open().await;
        h.coordinator.join(a, "a").await;
        h.coordinator.join(b, "b").await;
        drain(&mut a_rx);

        h.coordinator.disconnect(&h.endpoint, b).await;
        let frames = drain(&mut a_rx);
        assert_eq!(
            frames,
            vec![json!({
                "type": "participantUpdate",
                "data": { "participants": ["a", "b"], "connected": ["a"] }
            })]
        );

        let status = h.coordinator.status().await;
        assert_eq!(status.participants, 2);
        assert_eq!(status.connections, 1);
        assert_eq!(status.phase, Phase::NotStarted);
    }

    #[tokio::test]
    async fn concurrent_picks_only_accept_one() {
        let h = harness().await;
        let (a, _a_rx) = h.open().await;
        let (b, _b_rx) = h.open().await;
        h.coordinator.join(a, "shark").await;
        h.coordinator.join(b, "rival").await;
        h.coordinator.start_draft("shark").await;
        let first = h.coordinator.current_state().await.draft_order()[0].clone();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let coordinator = h.coordinator.clone();
                let drafter = first.clone();
                tokio::spawn(async move {
                    coordinator
                        .draft_player(&drafter, mid_player(&format!("p{i}")))
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let state = h.coordinator.current_state().await;
        assert_eq!(state.history().len(), 1);
        assert!(state.history().iter().all(|p| p.drafter == first));
        assert_ne!(state.current_drafter(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn failed_snapshot_write_still_applies_and_broadcasts() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let endpoint = Arc::new(EndpointSink::new("plain"));
        let publisher = Publisher::new().with_sink(endpoint.clone());
        let coordinator = Coordinator::boot(
            "shark",
            SnapshotFile::new(blocker.join("draft_state.json")),
            publisher,
        )
        .await;

        let (tx, mut rx) = outbox();
        let id = coordinator.next_connection_id();
        coordinator.connect(&endpoint, id, tx).await;
        coordinator.join(id, "shark").await;

        assert_eq!(
            coordinator.current_state().await.participants(),
            ["shark".to_string()]
        );
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["type"], json!("draftState"));
        assert_eq!(frames[1]["type"], json!("participantUpdate"));
        assert_eq!(frames[1]["data"]["participants"], json!(["shark"]));
        assert!(!blocker.join("draft_state.json").exists());
    }
}
