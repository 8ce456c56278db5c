use tokio::sync::mpsc;
use tracing::debug;

/// Notification emitted when the client ends a session on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Stored credentials were cleared after an unrecoverable 401.
    SessionExpired,
    /// The caller should present its sign-in surface.
    LoginRequired,
}

/// Hooks invoked by the client when authentication state changes under it.
///
/// Implementations bridge to whatever owns the surrounding application: a UI
/// event loop, a state container, a test double. The client only calls these
/// hooks; it never renders or navigates itself.
pub trait SessionEvents: Send + Sync {
    /// Stored credentials were cleared; the user is no longer signed in.
    fn session_expired(&self);

    /// The caller should present its sign-in surface.
    fn login_required(&self);
}

/// Default sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl SessionEvents for NullEvents {
    fn session_expired(&self) {}
    fn login_required(&self) {}
}

/// Forwards notifications over an unbounded channel, for consumers that
/// already drive an event loop.
pub struct ChannelEvents {
    sender: mpsc::UnboundedSender<AuthEvent>,
}

impl ChannelEvents {
    /// Returns the adapter plus the receiving end for the caller's loop.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuthEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: AuthEvent) {
        // A closed channel just means nobody is listening anymore
        if self.sender.send(event).is_err() {
            debug!(?event, "Auth event dropped, receiver gone");
        }
    }
}

impl SessionEvents for ChannelEvents {
    fn session_expired(&self) {
        self.send(AuthEvent::SessionExpired);
    }

    fn login_required(&self) {
        self.send(AuthEvent::LoginRequired);
    }
}
