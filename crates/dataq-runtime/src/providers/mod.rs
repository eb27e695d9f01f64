//! Host implementations.
//!
//! Only the in-memory simulator lives in this crate; wire-protocol
//! transports implement [`HostConnector`](crate::transport::HostConnector)
//! in their own crates.

pub mod memory;

pub use memory::{HostStats, InMemoryHost, InMemorySession, SignonRecord};
