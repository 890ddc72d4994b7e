//! Filter state publication.
//!
//! Every selection transition produces one `FilterChange` carrying the full
//! selection snapshot. Subscribers receive it synchronously, in transition
//! order. A subscriber that can no longer deliver (closed channel) answers
//! `Delivery::Detach` and is dropped from the list.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::facets::SelectionState;

// ── Payload ────────────────────────────────────────────────────────────────

/// Snapshot handed to subscribers after a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChange {
    /// Starts at 1 and grows by one per transition.
    pub revision: u64,
    pub state: SelectionState,
    /// Size of the filtered case subset under `state`.
    pub total: usize,
}

impl FilterChange {
    /// IPC payload for a results view living across a process boundary.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Subscribers ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Detach,
}

pub trait FilterSubscriber: Send {
    fn on_filter_change(&mut self, change: &FilterChange) -> Delivery;
}

impl<F> FilterSubscriber for F
where
    F: FnMut(&FilterChange) + Send,
{
    fn on_filter_change(&mut self, change: &FilterChange) -> Delivery {
        self(change);
        Delivery::Delivered
    }
}

/// Forwards changes to an async consumer over an unbounded tokio channel.
#[derive(Debug)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<FilterChange>,
}

impl ChannelSubscriber {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FilterChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FilterSubscriber for ChannelSubscriber {
    fn on_filter_change(&mut self, change: &FilterChange) -> Delivery {
        match self.tx.send(change.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(_) => {
                tracing::debug!(revision = change.revision, "Filter channel closed by receiver");
                Delivery::Detach
            }
        }
    }
}

// ── Publisher ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct FilterPublisher {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Box<dyn FilterSubscriber>)>,
}

impl std::fmt::Debug for FilterPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPublisher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl FilterPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FilterSubscriber + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns false when the id was not (or no longer) subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver to every subscriber in subscription order. Returns how many
    /// accepted the change.
    pub fn publish(&mut self, change: &FilterChange) -> usize {
        let mut delivered = 0;
        self.subscribers.retain_mut(|(id, subscriber)| {
            match subscriber.on_filter_change(change) {
                Delivery::Delivered => {
                    delivered += 1;
                    true
                }
                Delivery::Detach => {
                    tracing::warn!(subscription = id.0, "Dropping detached filter subscriber");
                    false
                }
            }
        });
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
