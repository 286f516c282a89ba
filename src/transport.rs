//! Chat transport collaborator — connection lifecycle and inbound events.
//!
//! The registry never speaks the chat protocol itself; it consumes an event
//! stream and sends plain text replies. A real transport bridges these to
//! the chat network, the test suite scripts them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One inbound chat message with the tags the admission rule needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub channel: String,
    pub timestamp: DateTime<Utc>,
    pub is_sub: bool,
    pub is_mod: bool,
    /// Sender display color as `#RRGGBB`, when the chat service provides one.
    pub color: Option<String>,
}

/// Events the transport delivers to the session loop.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Message(ChatMessage),
    /// Outcome of the connection attempt. Delivered once per session.
    Connected { success: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("join failed: {0}")]
    Join(String),
    #[error("send failed: {0}")]
    Send(String),
}

/// Connection lifecycle of the chat client.
///
/// `start` hands back the inbound event stream; the token is cancelled when
/// the session stops and the transport is expected to wind down its receive
/// loop cooperatively.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn start(
        &self,
        username: &str,
        token: &str,
        cancel: CancellationToken,
    ) -> Result<mpsc::UnboundedReceiver<ChatEvent>, TransportError>;

    async fn join_channel(&self, channel: &str) -> Result<(), TransportError>;

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), TransportError>;
}
