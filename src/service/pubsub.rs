use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Errors raised by a pub/sub transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubError {
    /// The transport is gone; no further messages can flow.
    Closed,
    Transport(String),
}

impl fmt::Display for PubSubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PubSubError::Closed => f.write_str("pub/sub transport closed"),
            PubSubError::Transport(msg) => write!(f, "pub/sub transport error: {msg}"),
        }
    }
}

impl std::error::Error for PubSubError {}

/// A pub/sub transport with string payloads.
pub trait PubSub: Send + Sync + 'static {
    fn subscribe(&self, channel: &str) -> Result<Subscription, PubSubError>;

    fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError>;
}

/// An active subscription to one channel.
pub struct Subscription {
    channel: String,
    receiver: Receiver<String>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Build a subscription from a message receiver and the action that ends it.
    pub fn new(
        channel: &str,
        receiver: Receiver<String>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            channel: channel.to_string(),
            receiver,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Block for the next message; `None` once the transport closed.
    pub fn recv(&self) -> Option<String> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, PubSubError> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PubSubError::Transport("timed out".to_string()),
            RecvTimeoutError::Disconnected => PubSubError::Closed,
        })
    }

    pub fn try_recv(&self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish()
    }
}

type Subscribers = HashMap<String, Vec<(u64, Sender<String>)>>;

/// In-process broker, used by tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    subscribers: Arc<Mutex<Subscribers>>,
    next_id: AtomicU64,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.get(channel).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl PubSub for MemoryBroker {
    fn subscribe(&self, channel: &str) -> Result<Subscription, PubSubError> {
        let (tx, rx) = mpsc::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .map_err(|_| PubSubError::Closed)?
            .entry(channel.to_string())
            .or_default()
            .push((id, tx));

        let subscribers = Arc::clone(&self.subscribers);
        let name = channel.to_string();
        Ok(Subscription::new(channel, rx, move || {
            if let Ok(mut subs) = subscribers.lock() {
                if let Some(list) = subs.get_mut(&name) {
                    list.retain(|(sid, _)| *sid != id);
                }
            }
        }))
    }

    fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        let mut subs = self.subscribers.lock().map_err(|_| PubSubError::Closed)?;
        if let Some(list) = subs.get_mut(channel) {
            list.retain(|(_, tx)| tx.send(message.to_string()).is_ok());
        }
        Ok(())
    }
}
