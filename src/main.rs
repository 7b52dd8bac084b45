use draft_coordinator::{config::Config, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load_from_env()?;
    info!("Loaded config. Admin is {}.", config.admin_username);

    let server = server::bind(&config).await?;
    for (name, addr) in server.local_addrs()? {
        info!("Listener {} bound to {}.", name, addr);
    }

    info!("Started server.");
    server.run().await
}
