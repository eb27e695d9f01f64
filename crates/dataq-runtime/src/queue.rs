//! Read, peek and write on plain and keyed data queues.

use crate::addressing::{pad, QueueIdentity};
use crate::error::{DataqError, TransportError};
use crate::message::{KeyDescriptor, QueueMessage};
use crate::transport::{HostError, HostSession, RawEntry, ReadMode};
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Data queue operations over a live session.
///
/// Failures caused by the connection are returned as
/// [`DataqError::Transport`]; everything else the host refuses is a
/// [`DataqError::Read`] or [`DataqError::Write`] and never a reason to
/// reconnect.
pub struct QueueAccess<'a> {
    session: &'a mut dyn HostSession,
}

impl<'a> QueueAccess<'a> {
    pub fn new(session: &'a mut dyn HostSession) -> Self {
        Self { session }
    }

    /// Read one entry, waiting up to `wait` for it to arrive.
    ///
    /// With a key descriptor the queue is treated as keyed and the key is
    /// padded to the length the queue reports.
    pub async fn read(
        &mut self,
        queue: &QueueIdentity,
        key: Option<&KeyDescriptor>,
        wait: Duration,
        mode: ReadMode,
    ) -> Result<Option<QueueMessage>, DataqError> {
        if !self.session.is_connected() {
            warn!(queue = %queue, "Session connection check failed when reading data queue");
            return Err(TransportError::new("Data queue read connection dropped").into());
        }

        let path = queue.path();
        let entry = match key {
            Some(descriptor) => self.read_keyed(&path, descriptor, wait, mode).await,
            None => self.session.read_entry(&path, wait, mode).await,
        }
        .map_err(|e| read_failure(&path, e))?;

        if entry.is_some() {
            debug!(queue = %queue, peek = mode.is_peek(), "Data queue entry received");
        }
        Ok(entry.map(QueueMessage::from_raw))
    }

    async fn read_keyed(
        &mut self,
        path: &str,
        descriptor: &KeyDescriptor,
        wait: Duration,
        mode: ReadMode,
    ) -> Result<Option<RawEntry>, HostError> {
        let key_length = self.session.key_length(path).await?;
        let key = pad(&descriptor.key, key_length);
        self.session
            .read_keyed_entry(path, &key, descriptor.search_type, wait, mode)
            .await
    }

    /// Write one entry; with a key the queue is treated as keyed
    pub async fn write(
        &mut self,
        queue: &QueueIdentity,
        key: Option<&str>,
        payload: &str,
    ) -> Result<(), DataqError> {
        if !self.session.is_connected() {
            warn!(queue = %queue, "Session connection check failed when writing data queue");
            return Err(TransportError::new("Data queue write connection dropped").into());
        }

        let path = queue.path();
        let result = match key {
            Some(key) => self.write_keyed(&path, key, payload).await,
            None => self.session.write_entry(&path, payload).await,
        };

        result.map_err(|e| write_failure(&path, e))?;
        debug!(queue = %queue, keyed = key.is_some(), "Data queue entry written");
        Ok(())
    }

    async fn write_keyed(&mut self, path: &str, key: &str, payload: &str) -> Result<(), HostError> {
        let key_length = self.session.key_length(path).await?;
        self.session
            .write_keyed_entry(path, &pad(key, key_length), payload)
            .await
    }
}

fn read_failure(path: &str, error: HostError) -> DataqError {
    if error.is_connection_loss() {
        TransportError::with_cause("Data queue read connection dropped", error).into()
    } else {
        DataqError::Read {
            queue: path.to_string(),
            source: error,
        }
    }
}

fn write_failure(path: &str, error: HostError) -> DataqError {
    if error.is_connection_loss() {
        TransportError::with_cause("Data queue write connection dropped", error).into()
    } else {
        DataqError::Write {
            queue: path.to_string(),
            source: error,
        }
    }
}
