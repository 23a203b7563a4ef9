use thiserror::Error;
use tokio::sync::mpsc;

use super::messages::{RealtimeInput, ServerMessage};

/// Parameters for opening a duplex session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Model identifier
    pub model: String,
    /// Prebuilt synthetic voice for audio responses
    pub voice: String,
}

/// Lifecycle and payload events emitted by an open session
#[derive(Debug)]
pub enum SessionEvent {
    /// The service accepted the setup and is ready for audio
    Opened,
    /// A payload arrived; may or may not carry audio
    Message(ServerMessage),
    /// The service closed the session
    Closed,
    /// The transport reported an error after opening
    Error(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open session: {0}")]
    Connect(String),

    #[error("failed to send on session: {0}")]
    Send(String),

    #[error("session is closed")]
    Closed,
}

/// The send half of an open duplex session.
///
/// Sends are fire-and-forget: no acknowledgement is awaited and failures
/// surface only through the event stream.
#[async_trait::async_trait]
pub trait SessionSink: Send {
    async fn send(&mut self, input: RealtimeInput) -> Result<(), SessionError>;

    /// Close the session (idempotent)
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// An open duplex session: a sink for outbound chunks and an ordered stream
/// of inbound events.
pub struct DuplexSession {
    pub sink: Box<dyn SessionSink>,
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Opens duplex streaming sessions against the inference service
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn open(&self, settings: &SessionSettings) -> Result<DuplexSession, SessionError>;
}
