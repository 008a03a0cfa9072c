// File: ./src/events.rs
//! Publish/subscribe channel for content-change notifications.
//!
//! The editing surface publishes from whatever thread it runs on. Each
//! subscriber gets its own unbounded queue and drains it on its own context,
//! so store mutations never interleave with lifecycle work.
use crate::model::ContentChangeEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

pub type SubscriptionId = u64;

/// Receiving end of a registration. Give it back to
/// [`ContentEventBus::unregister`] to stop delivery.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<ContentChangeEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next queued event, without waiting.
    pub fn try_recv(&mut self) -> Option<ContentChangeEvent> {
        self.receiver.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<ContentChangeEvent> {
        self.receiver.recv().await
    }
}

#[derive(Debug, Default)]
pub struct ContentEventBus {
    subscribers: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<ContentChangeEvent>>>,
    next_id: AtomicU64,
    registrations: AtomicUsize,
    unregistrations: AtomicUsize,
}

impl ContentEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribers(
        &self,
    ) -> MutexGuard<'_, HashMap<SubscriptionId, mpsc::UnboundedSender<ContentChangeEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::unbounded_channel();
        self.subscribers().insert(id, tx);
        self.registrations.fetch_add(1, Ordering::Relaxed);
        log::debug!("Content-change subscription {} registered", id);
        Subscription { id, receiver }
    }

    /// Returns false if the subscription was already gone.
    pub fn unregister(&self, subscription: Subscription) -> bool {
        let removed = self.subscribers().remove(&subscription.id).is_some();
        if removed {
            self.unregistrations.fetch_add(1, Ordering::Relaxed);
            log::debug!("Content-change subscription {} unregistered", subscription.id);
        }
        removed
    }

    /// Queues `event` for every live subscriber. Returns how many received it.
    pub fn publish(&self, event: ContentChangeEvent) -> usize {
        let mut subscribers = self.subscribers();
        subscribers.retain(|_, tx| !tx.is_closed());
        subscribers
            .values()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Total `register` calls over the bus lifetime.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::Relaxed)
    }

    /// Total effective `unregister` calls over the bus lifetime.
    pub fn unregistrations(&self) -> usize {
        self.unregistrations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentAction;

    #[test]
    fn test_publish_reaches_each_subscriber_once() {
        let bus = ContentEventBus::new();
        let mut a = bus.register();
        let mut b = bus.register();

        let delivered = bus.publish(ContentChangeEvent::new("/f.rs", ContentAction::Insert));
        assert_eq!(delivered, 2);
        assert_eq!(a.try_recv().unwrap().file.unwrap().to_str(), Some("/f.rs"));
        assert!(a.try_recv().is_none());
        assert!(b.try_recv().is_some());
    }

    #[test]
    fn test_unregistered_subscriber_gets_nothing() {
        let bus = ContentEventBus::new();
        let sub = bus.register();
        assert!(bus.unregister(sub));

        assert_eq!(bus.publish(ContentChangeEvent::detached(ContentAction::Delete)), 0);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.registrations(), 1);
        assert_eq!(bus.unregistrations(), 1);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let bus = ContentEventBus::new();
        drop(bus.register());
        assert_eq!(bus.publish(ContentChangeEvent::detached(ContentAction::Insert)), 0);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.unregistrations(), 0);
    }

    #[tokio::test]
    async fn test_async_receive() {
        let bus = std::sync::Arc::new(ContentEventBus::new());
        let mut sub = bus.register();
        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(ContentChangeEvent::new("/late.rs", ContentAction::SetNewText));
        });
        let event = sub.recv().await.unwrap();
        assert_eq!(event.action, ContentAction::SetNewText);
    }
}
