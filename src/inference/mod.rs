//! Client side of the inference service contracts
//!
//! Two surfaces are modeled:
//! - the duplex live session (`SessionService` / `SessionSink`), carried over
//!   WebSocket by [`GeminiLive`]
//! - one-shot `generateContent` wire types shared with the speech module

pub mod gemini;
pub mod messages;
pub mod session;

pub use gemini::GeminiLive;
pub use messages::{MediaChunk, RealtimeInput, ServerMessage};
pub use session::{
    DuplexSession, SessionError, SessionEvent, SessionService, SessionSettings, SessionSink,
};
