use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::routes::draft::{ensure_coordinator, get_state};
use crate::services::{
    coordinator::Coordinator,
    persistence::SnapshotFile,
    publisher::{EndpointSink, Publisher},
    websocket::websocket_handler,
};

pub fn router(coordinator: Arc<Coordinator>, endpoint: Arc<EndpointSink>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/draft/state", get(get_state))
        .route("/draft/ensure", post(ensure_coordinator))
        .layer(Extension(coordinator))
        .layer(Extension(endpoint))
        .layer(CorsLayer::permissive())
}

struct BoundListener {
    name: String,
    endpoint: Arc<EndpointSink>,
    listener: TcpListener,
}

/// Listeners bound and coordinator booted, not yet serving.
pub struct Server {
    coordinator: Arc<Coordinator>,
    listeners: Vec<BoundListener>,
}

/// Binds every configured listener and boots the coordinator with one sink
/// per listener.
pub async fn bind(config: &Config) -> anyhow::Result<Server> {
    let mut listeners = Vec::with_capacity(config.listeners.len());
    let mut publisher = Publisher::new();

    for listener_config in &config.listeners {
        let addr = listener_config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        let endpoint = Arc::new(EndpointSink::new(listener_config.name.clone()));
        publisher = publisher.with_sink(endpoint.clone());
        listeners.push(BoundListener {
            name: listener_config.name.clone(),
            endpoint,
            listener,
        });
    }

    let coordinator = Coordinator::boot(
        config.admin_username.clone(),
        SnapshotFile::new(config.snapshot_path.clone()),
        publisher,
    )
    .await;

    Ok(Server {
        coordinator,
        listeners,
    })
}

impl Server {
    pub fn local_addrs(&self) -> anyhow::Result<Vec<(String, SocketAddr)>> {
        self.listeners
            .iter()
            .map(|bound| Ok((bound.name.clone(), bound.listener.local_addr()?)))
            .collect()
    }

    /// Serves every listener until one of them fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut tasks = JoinSet::new();
        for bound in self.listeners {
            let app = router(self.coordinator.clone(), bound.endpoint);
            info!("Started listener {}.", bound.name);
            tasks.spawn(async move { axum::serve(bound.listener, app).await });
        }

        while let Some(result) = tasks.join_next().await {
            result??;
        }
        Ok(())
    }
}
