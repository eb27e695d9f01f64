//! # Data Queue Runtime
//!
//! Connection lifecycle and data queue access for midrange hosts.
//!
//! This library provides:
//! - Sign-on with library list setup and cached health checks
//! - Reconnect loops with bounded or unbounded retry policies
//! - Read, peek and write on plain and keyed data queues
//! - Long and infinite waits that survive a dropped connection
//! - Remote command execution with aggregated diagnostics
//!
//! ## Module Organization
//!
//! - [`transport`] - Capability traits implemented by host transports
//! - [`connection`] - Session ownership, health checks and reconnects
//! - [`queue`] - Single data queue calls over a live session
//! - [`polling`] - Waiting reads that reconnect mid-wait
//! - [`command`] - Command execution
//! - [`client`] - The application-facing client
//! - [`providers`] - In-memory host for tests and development

// Module declarations
pub mod addressing;
pub mod client;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod polling;
pub mod providers;
pub mod queue;
pub mod retry;
pub mod search;
pub mod session;
pub mod telemetry;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use addressing::{build_path, pad, QueueIdentity, LIBRARY_BASE_PATH};
pub use client::DataQueueClient;
pub use command::CommandExecutor;
pub use crate::config::{ClientSettings, ConnectionSettings, DataqConfig, LoggingConfig, Secret};
pub use connection::ConnectionManager;
pub use error::{
    CommandError, ConfigurationError, ConnectError, ConnectFailure, DataqError, TransportError,
};
pub use message::{KeyDescriptor, QueueMessage, ReadRequest, TotalWait, QUEUE_KEY_PROPERTY};
pub use polling::{PollingReadLoop, MAX_QUEUE_WAIT};
pub use providers::InMemoryHost;
pub use queue::QueueAccess;
pub use retry::RetryPolicy;
pub use search::SearchType;
pub use session::SessionHandle;
pub use transport::{
    CommandOutcome, HostConnector, HostError, HostMessage, HostSession, RawEntry, ReadMode,
    SocketProperties,
};
