//! In-process change broadcast for key-value stores.
//!
//! # Invariants
//! - Every subscriber sees changes in the order they were applied.
//! - A dropped receiver never fails a write; it is pruned on the next send.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// One mutation of a key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

/// Fan-out list of subscribers. Disconnected receivers are pruned on send.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    senders: Mutex<Vec<Sender<StorageChange>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<StorageChange> {
        let (sender, receiver) = channel();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(sender);
        }
        receiver
    }

    pub fn notify(&self, change: StorageChange) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.retain(|sender| sender.send(change.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().map_or(0, |senders| senders.len())
    }
}
