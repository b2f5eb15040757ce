//! Source change notifications
//!
//! Sources publish lifecycle events to subscribers. Each event carries the
//! current description snapshot — never credential material. Emission waits
//! for every subscriber to settle and then propagates the first failure,
//! if any.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::source::SourceDescription;

/// A lifecycle event with the source's current description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Unlocked(SourceDescription),
    Locked(SourceDescription),
    ColourUpdated(SourceDescription),
}

impl SourceEvent {
    pub fn description(&self) -> &SourceDescription {
        match self {
            SourceEvent::Unlocked(description) => description,
            SourceEvent::Locked(description) => description,
            SourceEvent::ColourUpdated(description) => description,
        }
    }
}

/// Receives source lifecycle events
#[async_trait]
pub trait SourceSubscriber: Send + Sync {
    async fn notify(&self, event: &SourceEvent) -> anyhow::Result<()>;
}

/// Shared subscriber list for one source
#[derive(Clone, Default)]
pub struct SubscriberSet {
    subscribers: Arc<RwLock<Vec<Arc<dyn SourceSubscriber>>>>,
}

impl SubscriberSet {
    pub fn subscribe(&self, subscriber: Arc<dyn SourceSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Deliver the event to every subscriber, then surface the first failure
    pub async fn emit(&self, event: SourceEvent) -> anyhow::Result<()> {
        let listeners: Vec<_> = self.subscribers.read().iter().cloned().collect();
        let mut first_failure = None;
        for listener in listeners {
            if let Err(err) = listener.notify(&event).await {
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
