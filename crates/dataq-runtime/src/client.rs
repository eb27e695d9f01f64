//! Data queue client: the entry points used by applications.
//!
//! Two kinds of callers share the same connection handling:
//! - direct calls (`read_queue`, `write_queue`, `run_command`) reconnect a
//!   bounded number of times before giving up;
//! - background polling (`poll_queue`) reconnects without limit and keeps
//!   reading at a fixed cadence.

use crate::addressing::QueueIdentity;
use crate::command::CommandExecutor;
use crate::config::{ClientSettings, ConnectionSettings, DataqConfig};
use crate::connection::ConnectionManager;
use crate::error::DataqError;
use crate::message::{QueueMessage, ReadRequest, TotalWait};
use crate::polling::PollingReadLoop;
use crate::queue::QueueAccess;
use crate::transport::HostConnector;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Client for one host connection
#[derive(Debug)]
pub struct DataQueueClient {
    manager: ConnectionManager,
    settings: ClientSettings,
}

impl DataQueueClient {
    /// Create a client; call [`DataQueueClient::connect`] to sign on
    pub fn new(
        connector: Arc<dyn HostConnector>,
        connection: ConnectionSettings,
        settings: ClientSettings,
    ) -> Self {
        let manager =
            ConnectionManager::new(connector, connection).with_keep_alive(settings.keep_alive());
        Self { manager, settings }
    }

    pub fn from_config(connector: Arc<dyn HostConnector>, config: DataqConfig) -> Self {
        Self::new(connector, config.connection, config.client)
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ConnectionManager {
        &mut self.manager
    }

    pub async fn connect(&mut self) -> Result<(), DataqError> {
        self.manager.reconnect().await?;
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        self.manager.disconnect().await;
    }

    pub async fn is_connected(&mut self) -> bool {
        self.manager.is_connected().await
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.manager.connection_id()
    }

    /// Read one message, waiting as long as the request allows
    pub async fn read_queue(
        &mut self,
        request: &ReadRequest,
    ) -> Result<Option<QueueMessage>, DataqError> {
        PollingReadLoop::new(&mut self.manager, self.settings.processor_policy())
            .with_max_call_wait(self.settings.max_queue_wait())
            .read(request)
            .await
    }

    /// Write one message, keyed when `key` is given
    pub async fn write_queue(
        &mut self,
        queue: &QueueIdentity,
        key: Option<&str>,
        payload: &str,
    ) -> Result<(), DataqError> {
        self.manager
            .validate_or_reconnect(&self.settings.processor_policy())
            .await;
        let result = match self.manager.checked_session().await {
            Ok(session) => QueueAccess::new(session).write(queue, key, payload).await,
            Err(e) => Err(e.into()),
        };
        self.distrust_on_transport(result)
    }

    /// Run a command on the host
    pub async fn run_command(&mut self, command: &str) -> Result<(), DataqError> {
        self.manager
            .validate_or_reconnect(&self.settings.processor_policy())
            .await;
        let result = match self.manager.checked_session().await {
            Ok(session) => CommandExecutor::new(session).run(command).await,
            Err(e) => Err(e.into()),
        };
        self.distrust_on_transport(result)
    }

    /// After a transport failure the next direct call checks the host
    /// instead of trusting the cached health check
    fn distrust_on_transport<T>(
        &mut self,
        result: Result<T, DataqError>,
    ) -> Result<T, DataqError> {
        if let Err(e) = &result {
            if e.is_transport() {
                debug!(
                    host = %self.manager.host(),
                    "Expiring health check after transport failure"
                );
                self.manager.expire_health_check();
            }
        }
        result
    }

    /// Poll the queue until `handler` breaks.
    ///
    /// Each cycle waits up to the per-call cap, hands a message to the
    /// handler if one arrived, then pauses for the poll interval. The wait
    /// in `request` is ignored.
    pub async fn poll_queue<F>(
        &mut self,
        request: &ReadRequest,
        mut handler: F,
    ) -> Result<(), DataqError>
    where
        F: FnMut(QueueMessage) -> ControlFlow<()> + Send,
    {
        let cycle = request
            .clone()
            .with_wait(TotalWait::Bounded(self.settings.max_queue_wait()));
        let policy = self.settings.source_policy();
        info!(queue = %request.queue, "Polling data queue");

        loop {
            let received = PollingReadLoop::new(&mut self.manager, policy)
                .with_max_call_wait(self.settings.max_queue_wait())
                .read(&cycle)
                .await?;

            if let Some(message) = received {
                if handler(message).is_break() {
                    debug!(queue = %request.queue, "Polling stopped by handler");
                    return Ok(());
                }
            }

            tokio::time::sleep(self.settings.poll_interval()).await;
        }
    }
}
