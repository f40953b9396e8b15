//! Live connection tracking.
//!
//! Every accepted connection is registered before parsing starts and
//! deregistered when its [`ConnectionGuard`] drops, whichever way the
//! handling task ends. The shutdown coordinator uses the registry to wait
//! for in-flight work and to force-close whatever is left.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::{watch, Notify};

/// Unique identifier for a tracked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

struct Entry {
    peer: SocketAddr,
    accepted_at: Instant,
    close: Arc<Notify>,
}

struct Inner {
    connections: Mutex<HashMap<ConnectionId, Entry>>,
    next_id: AtomicU64,
    active: watch::Sender<usize>,
}

/// Shared set of live connections.
///
/// The lock is only taken for insert, remove and enumeration, never
/// across an `.await`.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<Inner>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        let (active, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                connections: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                active,
            }),
        }
    }

    /// Tracks a new connection until the returned guard is dropped.
    pub fn register(&self, peer: SocketAddr) -> ConnectionGuard {
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let close = Arc::new(Notify::new());

        {
            let mut connections = self.lock();
            connections.insert(
                id,
                Entry {
                    peer,
                    accepted_at: Instant::now(),
                    close: close.clone(),
                },
            );
            self.inner.active.send_replace(connections.len());
        }

        tracing::trace!(conn = %id, peer = %peer, "Connection registered");

        ConnectionGuard {
            id,
            registry: self.clone(),
            close,
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Signals every live connection to close. Returns how many were
    /// signalled; they leave the registry once their tasks unwind.
    pub fn force_close_all(&self) -> usize {
        let connections = self.lock();
        for (id, entry) in connections.iter() {
            tracing::warn!(
                conn = %id,
                peer = %entry.peer,
                age = ?entry.accepted_at.elapsed(),
                "Force-closing connection"
            );
            entry.close.notify_one();
        }
        connections.len()
    }

    /// Resolves once no connection is registered.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.active.subscribe();
        // The sender lives in `self`, so this cannot fail.
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    fn deregister(&self, id: ConnectionId) {
        let mut connections = self.lock();
        if connections.remove(&id).is_some() {
            self.inner.active.send_replace(connections.len());
        }
        drop(connections);

        tracing::trace!(conn = %id, "Connection deregistered");
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Entry>> {
        self.inner
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration handle held by a connection task.
///
/// Dropping it removes the connection from the registry.
pub struct ConnectionGuard {
    id: ConnectionId,
    registry: ConnectionRegistry,
    close: Arc<Notify>,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolves when the registry asks this connection to close.
    pub async fn closed(&self) {
        self.close.notified().await;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn guard_drop_deregisters() {
        let registry = ConnectionRegistry::new();
        let a = registry.register(peer());
        let b = registry.register(peer());

        assert_ne!(a.id(), b.id());
        assert_eq!(registry.active_count(), 2);

        drop(a);
        assert_eq!(registry.active_count(), 1);
        drop(b);
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn force_close_wakes_guard() {
        let registry = ConnectionRegistry::new();
        let guard = registry.register(peer());

        assert_eq!(registry.force_close_all(), 1);
        tokio::time::timeout(Duration::from_secs(1), guard.closed())
            .await
            .expect("close signal should be delivered");
    }

    #[tokio::test]
    async fn wait_idle_resolves_after_last_drop() {
        let registry = ConnectionRegistry::new();
        let guard = registry.register(peer());

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle should resolve")
            .unwrap();
    }
}
