//! Common test utilities for data queue integration tests
//!
//! This module provides:
//! - A simulated host with the standard user, queues and libraries
//! - Helpers for building clients against that host

use dataq_runtime::{
    ClientSettings, ConnectionSettings, DataQueueClient, InMemoryHost, QueueIdentity,
};
use std::sync::Arc;

pub const HOST: &str = "prod400";
pub const USER: &str = "QUSER";
pub const PASSWORD: &str = "secret";
pub const LIBRARY: &str = "APPLIB";

/// Key length of the keyed test queue
pub const KEY_LENGTH: usize = 10;

pub fn plain_queue() -> QueueIdentity {
    QueueIdentity::new("ORDERS", LIBRARY)
}

pub fn keyed_queue() -> QueueIdentity {
    QueueIdentity::new("KORDERS", LIBRARY)
}

/// Host with one user, one plain queue and one keyed queue
pub fn standard_host() -> InMemoryHost {
    let host = InMemoryHost::new(HOST);
    host.add_user(USER, PASSWORD)
        .create_queue(&plain_queue())
        .create_keyed_queue(&keyed_queue(), KEY_LENGTH);
    host
}

pub fn connection_settings() -> ConnectionSettings {
    ConnectionSettings::new(HOST, USER, PASSWORD).with_library_list(LIBRARY)
}

#[allow(dead_code)]
pub fn client_for(host: &InMemoryHost) -> DataQueueClient {
    client_with(host, ClientSettings::default())
}

#[allow(dead_code)]
pub fn client_with(host: &InMemoryHost, settings: ClientSettings) -> DataQueueClient {
    DataQueueClient::new(Arc::new(host.clone()), connection_settings(), settings)
}
