//! Contract event fan-out.
//!
//! One [`EventBus`] per daemon. Every connected session holds its own
//! [`Subscription`] with an independent buffer; every event goes to every
//! session, and relevance is decided on the client. Delivery is
//! best-effort and at-most-once: there is no replay on reconnect, and a
//! session that falls more than `capacity` events behind skips the gap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use charter_types::ContractEvent;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

/// Anything mutation handlers can publish events to.
pub trait EventSink: Send + Sync {
    /// Publish an event. Must not block and must not fail the caller.
    fn emit(&self, event: ContractEvent);
}

/// Event bus for broadcasting contract events to connected sessions.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    sender: broadcast::Sender<ContractEvent>,
    sequence: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl EventBus {
    /// Create a new event bus with the given per-subscriber buffer capacity.
    pub fn init(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                sender,
                sequence: AtomicU64::new(0),
                shutdown,
            }),
        }
    }

    /// Subscribe a new session. `None` once the bus is shut down.
    pub fn subscribe(&self) -> Option<Subscription> {
        if self.is_shut_down() {
            return None;
        }
        Some(Subscription {
            events: self.inner.sender.subscribe(),
            shutdown: self.inner.shutdown.subscribe(),
        })
    }

    /// Close every session. Later emits are dropped.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.inner.sequence.load(Ordering::SeqCst)
    }

    /// Number of live sessions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: ContractEvent) {
        if self.is_shut_down() {
            debug!("Event bus shut down, dropping {}", event.name());
            return;
        }
        self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        let name = event.name();
        // Err only means there are no subscribers
        let delivered = self.inner.sender.send(event).unwrap_or(0);
        debug!("Emitted {} to {} session(s)", name, delivered);
    }
}

/// One session's view of the bus.
pub struct Subscription {
    events: broadcast::Receiver<ContractEvent>,
    shutdown: watch::Receiver<bool>,
}

impl Subscription {
    /// Wait for the next event. `None` when the bus shuts down.
    pub async fn next(&mut self) -> Option<ContractEvent> {
        loop {
            if *self.shutdown.borrow() {
                return None;
            }
            tokio::select! {
                received = self.events.recv() => match received {
                    Ok(event) => return Some(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session lagged, {} event(s) skipped", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_types::ContractId;

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::init(16);
        let mut first = bus.subscribe().expect("subscribe");
        let mut second = bus.subscribe().expect("subscribe");
        assert_eq!(bus.subscriber_count(), 2);

        let id = ContractId::generate();
        bus.emit(ContractEvent::deleted(id));

        assert_eq!(first.next().await, Some(ContractEvent::deleted(id)));
        assert_eq!(second.next().await, Some(ContractEvent::deleted(id)));
        assert_eq!(bus.sequence(), 1);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::init(4);
        bus.emit(ContractEvent::deleted(ContractId::generate()));
        assert_eq!(bus.sequence(), 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_backlog() {
        let bus = EventBus::init(4);
        let mut early = bus.subscribe().expect("subscribe");
        let first = ContractId::generate();
        bus.emit(ContractEvent::deleted(first));

        let mut late = bus.subscribe().expect("subscribe");
        let second = ContractId::generate();
        bus.emit(ContractEvent::deleted(second));

        assert_eq!(early.next().await, Some(ContractEvent::deleted(first)));
        assert_eq!(early.next().await, Some(ContractEvent::deleted(second)));
        assert_eq!(late.next().await, Some(ContractEvent::deleted(second)));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_gap() {
        let bus = EventBus::init(2);
        let mut slow = bus.subscribe().expect("subscribe");
        let ids: Vec<ContractId> = (0..5).map(|_| ContractId::generate()).collect();
        for id in &ids {
            bus.emit(ContractEvent::deleted(*id));
        }
        // Only the newest `capacity` events survive
        assert_eq!(slow.next().await, Some(ContractEvent::deleted(ids[3])));
        assert_eq!(slow.next().await, Some(ContractEvent::deleted(ids[4])));
    }

    #[tokio::test]
    async fn test_shutdown_ends_sessions() {
        let bus = EventBus::init(4);
        let mut session = bus.subscribe().expect("subscribe");
        let waiter = tokio::spawn(async move { session.next().await });

        bus.shutdown();
        let result = waiter.await.expect("join");
        assert_eq!(result, None);
        assert!(bus.subscribe().is_none());

        bus.emit(ContractEvent::deleted(ContractId::generate()));
        assert_eq!(bus.sequence(), 0);
    }
}
