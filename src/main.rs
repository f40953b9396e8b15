use tracing_subscriber::EnvFilter;

use wicket::app;
use wicket::config::Config;
use wicket::server::{signals, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let server = Server::bind(&cfg.server, app::service(app::router())).await?;
    server.run(signals::termination()).await?;

    Ok(())
}
