use tokio::sync::broadcast;
use tracing::debug;

/// Buffer size for session event subscribers.
/// Expiry is rare; a handful of slots covers subscribers that lag a tick.
const EVENT_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend rejected the stored credential (HTTP 401).
    Expired,
}

/// Process-wide session signal. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn notify_expired(&self) {
        // No subscribers is fine: nobody is listening for auth changes.
        if self.tx.send(SessionEvent::Expired).is_err() {
            debug!("Session expired with no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
