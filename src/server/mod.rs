//! Server lifecycle.
//!
//! # Data Flow
//! ```text
//! bind:     Config → TcpListener (fatal on failure)
//! serve:    accept → register → spawn(parse → dispatch → respond → close → deregister)
//! shutdown: signal → stop accepting → drain (bounded) → force-close stragglers
//! ```

pub mod listener;
pub mod registry;
pub mod shutdown;
pub mod signals;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::http::handler::BoxHandler;
use registry::ConnectionRegistry;
use shutdown::{DrainOutcome, Shutdown};

/// A bound server, ready to accept connections.
pub struct Server {
    listener: TcpListener,
    service: BoxHandler,
    registry: ConnectionRegistry,
    shutdown: Arc<Shutdown>,
    config: ServerConfig,
}

impl Server {
    /// Binds the listening socket. This is the only fatal startup error.
    pub async fn bind(config: &ServerConfig, service: BoxHandler) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;

        tracing::info!(address = %listener.local_addr()?, "Listening");

        Ok(Self {
            listener,
            service,
            registry: ConnectionRegistry::new(),
            shutdown: Arc::new(Shutdown::new()),
            config: config.clone(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle for starting shutdown without an OS signal.
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    pub fn registry(&self) -> ConnectionRegistry {
        self.registry.clone()
    }

    /// Serves until `signal` resolves (or shutdown is triggered through
    /// [`Server::shutdown_handle`]), then drains.
    pub async fn run<F>(self, signal: F) -> anyhow::Result<DrainOutcome>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server {
            listener,
            service,
            registry,
            shutdown,
            config,
        } = self;

        let watcher = {
            let shutdown = shutdown.clone();
            let mut triggered = shutdown.subscribe();
            tokio::spawn(async move {
                tokio::select! {
                    _ = signal => {
                        tracing::info!("Shutdown signal received");
                        shutdown.trigger();
                    }
                    _ = triggered.triggered() => {}
                }
            })
        };

        listener::run(
            listener,
            service,
            registry.clone(),
            config.parse_limits(),
            shutdown.subscribe(),
        )
        .await;

        watcher.await.context("shutdown watcher failed")?;

        let outcome = shutdown.drain(&registry, config.shutdown_timeout()).await;
        match outcome {
            DrainOutcome::Clean => tracing::info!("Server shutdown complete"),
            DrainOutcome::Forced { closed } => {
                tracing::warn!(closed, "Server shutdown complete after forced close");
            }
        }

        Ok(outcome)
    }
}
