use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::http::connection::Connection;
use crate::http::handler::BoxHandler;
use crate::http::parser::ParseLimits;
use crate::server::registry::ConnectionRegistry;
use crate::server::shutdown::ShutdownListener;

/// Pause after a failed accept while still running.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Accepts connections until shutdown is triggered, then drops the
/// listening socket.
///
/// Each connection is registered before its task is spawned, so a drain
/// that starts after this returns sees every accepted connection.
pub async fn run(
    listener: TcpListener,
    service: BoxHandler,
    registry: ConnectionRegistry,
    limits: ParseLimits,
    mut shutdown: ShutdownListener,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.triggered() => break,
            res = listener.accept() => res,
        };

        match accepted {
            Ok((socket, peer)) => {
                info!(peer = %peer, "Accepted connection");
                spawn_connection(socket, peer, &service, &registry, limits);
            }
            Err(_) if shutdown.is_triggered() => break,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed, retrying");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }

    drop(listener);
    info!("Listener closed, no longer accepting connections");
}

fn spawn_connection(
    socket: TcpStream,
    peer: std::net::SocketAddr,
    service: &BoxHandler,
    registry: &ConnectionRegistry,
    limits: ParseLimits,
) {
    let guard = registry.register(peer);
    let service = service.clone();

    tokio::spawn(async move {
        let mut conn = Connection::new(socket, peer, limits);

        tokio::select! {
            res = conn.run(&service) => {
                if let Err(e) = res {
                    tracing::error!(conn = %guard.id(), peer = %peer, error = ?e, "Connection error");
                }
            }
            _ = guard.closed() => {
                tracing::warn!(conn = %guard.id(), peer = %peer, "Connection closed by shutdown");
            }
        }

        // Socket first, then the registry entry.
        drop(conn);
        drop(guard);
    });
}
