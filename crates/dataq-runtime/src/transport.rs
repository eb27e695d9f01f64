//! Transport capability consumed by the runtime.
//!
//! The runtime never speaks the host's wire protocol itself. A transport
//! crate (or the [`InMemoryHost`](crate::providers::InMemoryHost) simulator)
//! implements [`HostConnector`] and [`HostSession`], and everything above
//! this module is written against those two traits.

use crate::search::SearchType;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Errors raised by the transport layer.
///
/// The variant records where the failure originated, which is what the
/// runtime uses to tell a lost connection apart from a rejected request.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unknown host: {host}")]
    UnknownHost { host: String },

    #[error("Cannot reach {host}: {message}")]
    Unreachable { host: String, message: String },

    #[error("Connection dropped: {message}")]
    ConnectionDropped { message: String },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Security failure: {message}")]
    Security { message: String },

    #[error("Object not found: {path}")]
    ObjectNotFound { path: String },

    #[error("Illegal object type for {path}: {message}")]
    IllegalObjectType { path: String, message: String },

    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("Request rejected by host: {message}")]
    Rejected { message: String },
}

impl HostError {
    /// Check if the failure came from the loss of the session or socket
    pub fn is_connection_loss(&self) -> bool {
        match self {
            Self::UnknownHost { .. } => true,
            Self::Unreachable { .. } => true,
            Self::ConnectionDropped { .. } => true,
            Self::Io(_) => true,
            Self::Security { .. } => false,
            Self::ObjectNotFound { .. } => false,
            Self::IllegalObjectType { .. } => false,
            Self::InvalidArgument { .. } => false,
            Self::Rejected { .. } => false,
        }
    }
}

/// Socket options applied to a session before sign-on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocketProperties {
    pub keep_alive: bool,
}

/// Whether a read removes the entry or leaves it on the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    #[default]
    Remove,
    Peek,
}

impl ReadMode {
    pub fn from_peek(peek: bool) -> Self {
        if peek {
            Self::Peek
        } else {
            Self::Remove
        }
    }

    pub fn is_peek(&self) -> bool {
        matches!(self, Self::Peek)
    }
}

/// Raw entry as returned by the host, padding included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub data: String,
    pub key: Option<String>,
}

/// Message attached by the host to a command run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    pub id: String,
    pub text: String,
    /// Extended help text, `None` until loaded
    pub help: Option<String>,
}

impl HostMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            help: None,
        }
    }
}

/// Result of running a command on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub succeeded: bool,
    pub messages: Vec<HostMessage>,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            messages: Vec::new(),
        }
    }

    pub fn failure(messages: Vec<HostMessage>) -> Self {
        Self {
            succeeded: false,
            messages,
        }
    }
}

/// Opens sessions against a host
#[async_trait]
pub trait HostConnector: Send + Sync {
    /// Create a session object for the host; no sign-on happens yet
    async fn open(
        &self,
        host: &str,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn HostSession>, HostError>;
}

/// A single session with the host.
///
/// A session is not safe for concurrent use; every method takes `&mut self`.
#[async_trait]
pub trait HostSession: Send {
    /// User profile the session signs on with
    fn user_id(&self) -> &str;

    /// Allow or forbid interactive sign-on prompts
    fn set_gui_available(&mut self, available: bool);

    fn set_socket_properties(&mut self, properties: SocketProperties);

    /// Connect and verify the credentials
    async fn validate_signon(&mut self) -> Result<(), HostError>;

    /// Local view of the socket state, performs no I/O
    fn is_connected(&self) -> bool;

    /// Whether the host release offers [`HostSession::is_connection_alive`]
    fn supports_liveness_check(&self) -> bool;

    /// Round-trip liveness check
    async fn is_connection_alive(&mut self) -> Result<bool, HostError>;

    async fn run_command(&mut self, command: &str) -> Result<CommandOutcome, HostError>;

    /// Fill in [`HostMessage::help`]
    async fn load_message_help(&mut self, message: &mut HostMessage) -> Result<(), HostError>;

    /// Fixed key length of a keyed data queue
    async fn key_length(&mut self, path: &str) -> Result<usize, HostError>;

    async fn read_entry(
        &mut self,
        path: &str,
        wait: Duration,
        mode: ReadMode,
    ) -> Result<Option<RawEntry>, HostError>;

    async fn read_keyed_entry(
        &mut self,
        path: &str,
        key: &str,
        search: SearchType,
        wait: Duration,
        mode: ReadMode,
    ) -> Result<Option<RawEntry>, HostError>;

    async fn write_entry(&mut self, path: &str, data: &str) -> Result<(), HostError>;

    async fn write_keyed_entry(&mut self, path: &str, key: &str, data: &str)
        -> Result<(), HostError>;

    /// Tear down every service the session has open
    async fn disconnect_all_services(&mut self);
}
