//! Lifecycle event bus
//!
//! Services announce every state change (drafts, enrichment, scheduling,
//! accounts) on an in-process broadcast channel. Emission never blocks and
//! never fails the operation that triggered it: with no subscribers the event
//! is simply dropped, and lagging subscribers lose the oldest events first.
//!
//! # Example
//!
//! ```no_run
//! use libcreatorcast::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::DraftDeleted {
//!     draft_id: "abc123".to_string(),
//!     cancelled_posts: 0,
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{GenerationKind, Platform};

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is the per-subscriber buffer before old events are dropped
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    DraftCreated {
        draft_id: String,
        platform: Platform,
    },

    DraftUpdated {
        draft_id: String,
    },

    /// A draft was deleted, cancelling any posts scheduled from it
    DraftDeleted {
        draft_id: String,
        cancelled_posts: usize,
    },

    EnrichmentCompleted {
        draft_id: String,
        kind: GenerationKind,
        /// Whether an existing value was overwritten
        replaced: bool,
    },

    /// Generation failed; the draft was left untouched
    EnrichmentFailed {
        draft_id: String,
        kind: GenerationKind,
        error: String,
    },

    PostScheduled {
        post_id: String,
        draft_id: String,
        platform: Platform,
        scheduled_at: i64,
    },

    PostCancelled {
        post_id: String,
        draft_id: String,
    },

    PostPublished {
        post_id: String,
        draft_id: String,
        platform: Platform,
    },

    AccountConnected {
        platform: Platform,
        /// True when an existing connection was replaced
        replaced: bool,
    },

    AccountDisconnected {
        platform: Platform,
        /// Scheduled posts still targeting the platform
        pending_posts: i64,
    },
}
