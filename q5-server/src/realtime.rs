//! In-process fan-out of new direct messages
//!
//! Every stored message is published once on a broadcast channel. Each
//! `/messages/stream` subscriber filters for its own conversations and
//! skips ids it has already delivered.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::db::{Conversation, DirectMessage};

/// Broadcast buffer per hub
pub const HUB_CAPACITY: usize = 256;

/// Delivered ids remembered per subscriber
const SEEN_CAPACITY: usize = 1024;

/// A stored message, addressed to both members of its conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEvent {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl MessageEvent {
    pub fn new(conversation: &Conversation, message: &DirectMessage) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            recipient_id: conversation.other_member(message.sender_id),
            body: message.body.clone(),
            created_at: message.created_at,
        }
    }

    pub fn involves(&self, profile: Uuid) -> bool {
        self.sender_id == profile || self.recipient_id == profile
    }
}

/// Broadcast hub shared through `AppState`
#[derive(Debug, Clone)]
pub struct MessageHub {
    tx: broadcast::Sender<MessageEvent>,
}

impl Default for MessageHub {
    fn default() -> Self {
        Self::new(HUB_CAPACITY)
    }
}

impl MessageHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers. Returns how many received it.
    pub fn publish(&self, event: MessageEvent) -> usize {
        let id = event.id;
        match self.tx.send(event) {
            Ok(n) => {
                tracing::debug!(message_id = %id, subscribers = n, "message published");
                n
            }
            // No open streams
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MessageEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Bounded set of delivered ids, oldest evicted first.
#[derive(Debug)]
pub struct SeenIds {
    order: VecDeque<Uuid>,
    set: HashSet<Uuid>,
    capacity: usize,
}

impl SeenIds {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            set: HashSet::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record `id`. False if it was already present.
    pub fn insert(&mut self, id: Uuid) -> bool {
        if !self.set.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

struct Subscription {
    rx: broadcast::Receiver<MessageEvent>,
    member: Uuid,
    seen: SeenIds,
}

/// Events for `member`'s conversations, each id at most once.
/// Ends when the hub is dropped.
pub fn member_stream(
    rx: broadcast::Receiver<MessageEvent>,
    member: Uuid,
) -> impl Stream<Item = MessageEvent> + Send + 'static {
    let sub = Subscription {
        rx,
        member,
        seen: SeenIds::new(SEEN_CAPACITY),
    };

    futures::stream::unfold(sub, |mut sub| async move {
        loop {
            match sub.rx.recv().await {
                Ok(event) => {
                    if !event.involves(sub.member) || !sub.seen.insert(event.id) {
                        continue;
                    }
                    return Some((event, sub));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(member = %sub.member, skipped, "message stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn event(sender: Uuid, recipient: Uuid) -> MessageEvent {
        MessageEvent {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender_id: sender,
            recipient_id: recipient,
            body: "hello".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn seen_ids_reject_duplicates_and_evict() {
        let mut seen = SeenIds::new(2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert!(seen.insert(a));
        assert!(!seen.insert(a));
        assert!(seen.insert(b));
        assert!(seen.insert(c));
        assert_eq!(seen.len(), 2);
        // `a` was evicted
        assert!(seen.insert(a));
    }

    #[test]
    fn publish_without_subscribers() {
        let hub = MessageHub::default();
        assert_eq!(hub.publish(event(Uuid::new_v4(), Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn stream_filters_members_and_duplicates() {
        let hub = MessageHub::default();
        let me = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let stream = member_stream(hub.subscribe(), me);
        futures::pin_mut!(stream);

        let mine = event(friend, me);
        hub.publish(event(friend, stranger));
        hub.publish(mine.clone());
        hub.publish(mine.clone());
        let reply = event(me, friend);
        hub.publish(reply.clone());

        assert_eq!(stream.next().await, Some(mine));
        assert_eq!(stream.next().await, Some(reply));
    }

    #[tokio::test]
    async fn lagged_subscriber_keeps_going() {
        let hub = MessageHub::new(2);
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let stream = member_stream(hub.subscribe(), me);
        futures::pin_mut!(stream);

        let events: Vec<_> = (0..5).map(|_| event(other, me)).collect();
        for e in &events {
            hub.publish(e.clone());
        }

        // Oldest three were overwritten
        assert_eq!(stream.next().await, Some(events[3].clone()));
        assert_eq!(stream.next().await, Some(events[4].clone()));
    }

    #[tokio::test]
    async fn stream_ends_when_hub_dropped() {
        let hub = MessageHub::default();
        let stream = member_stream(hub.subscribe(), Uuid::new_v4());
        drop(hub);

        futures::pin_mut!(stream);
        assert_eq!(stream.next().await, None);
    }
}
