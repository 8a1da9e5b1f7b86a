use tokio::sync::broadcast;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Process-wide authentication signals raised by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The server rejected the current credential.
    ForcedLogout,
}

/// Broadcaster for [`AuthEvent`]s.
///
/// Publishers never learn who is listening; the session manager subscribes
/// like any other observer.
#[derive(Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of receivers that got the event.
    pub fn publish(&self, event: AuthEvent) -> usize {
        tracing::debug!(?event, "Publishing auth event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}
