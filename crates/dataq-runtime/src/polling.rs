//! Wait-for-message loop with reconnect in the middle of a wait.
//!
//! A caller may be willing to wait minutes, or forever, for a message, but a
//! single data queue call is capped at [`MAX_QUEUE_WAIT`] so a dropped
//! socket is noticed and repaired within one cap. The loop keeps issuing
//! capped reads until a message arrives or the caller's total wait is used
//! up:
//!
//! ```text
//! WAITING --message--> found
//! WAITING --nothing, total wait used--> timed out (bounded waits only)
//! WAITING --transport failure--> RECONNECTING --> WAITING
//! ```

use crate::connection::ConnectionManager;
use crate::error::{DataqError, TransportError};
use crate::message::{QueueMessage, ReadRequest, TotalWait};
use crate::queue::QueueAccess;
use crate::retry::RetryPolicy;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "polling_tests.rs"]
mod tests;

/// Longest wait handed to a single data queue call
pub const MAX_QUEUE_WAIT: Duration = Duration::from_secs(30);

/// Reads through a [`ConnectionManager`], reconnecting as needed
pub struct PollingReadLoop<'a> {
    manager: &'a mut ConnectionManager,
    policy: RetryPolicy,
    max_call_wait: Duration,
}

impl<'a> PollingReadLoop<'a> {
    pub fn new(manager: &'a mut ConnectionManager, policy: RetryPolicy) -> Self {
        Self {
            manager,
            policy,
            max_call_wait: MAX_QUEUE_WAIT,
        }
    }

    pub fn with_max_call_wait(mut self, max_call_wait: Duration) -> Self {
        self.max_call_wait = max_call_wait;
        self
    }

    /// Wait for one message.
    ///
    /// Returns `Ok(None)` only for bounded waits, and only once the whole
    /// wait has elapsed. Transport failures are repaired here; under a
    /// bounded policy a reconnect that runs out of attempts is returned as
    /// the transport error. Every other error is returned unchanged.
    pub async fn read(
        &mut self,
        request: &ReadRequest,
    ) -> Result<Option<QueueMessage>, DataqError> {
        let started = Instant::now();

        loop {
            self.manager.validate_or_reconnect(&self.policy).await;
            if !self.policy.is_unbounded() && !self.manager.is_connected().await {
                return Err(TransportError::new(format!(
                    "Unable to reconnect to {} after {} attempts",
                    self.manager.host(),
                    self.policy.max_attempts
                ))
                .into());
            }

            let call_wait = self.call_wait(request.wait, started.elapsed());
            match self.read_once(request, call_wait).await {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(e) if e.is_transport() => {
                    warn!(queue = %request.queue, error = %e, "Data queue connection issue");
                    self.manager.force_reconnect(&self.policy).await;
                    if !self.policy.is_unbounded() && !self.manager.is_connected().await {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }

            if let TotalWait::Bounded(total) = request.wait {
                if started.elapsed() >= total {
                    debug!(
                        queue = %request.queue,
                        waited = ?total,
                        "No data queue entry within wait time"
                    );
                    return Ok(None);
                }
            }
        }
    }

    fn call_wait(&self, wait: TotalWait, elapsed: Duration) -> Duration {
        match wait {
            TotalWait::Forever => self.max_call_wait,
            TotalWait::Bounded(total) => total.saturating_sub(elapsed).min(self.max_call_wait),
        }
    }

    async fn read_once(
        &mut self,
        request: &ReadRequest,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, DataqError> {
        let session = self.manager.checked_session().await?;
        QueueAccess::new(session)
            .read(&request.queue, request.key.as_ref(), wait, request.mode)
            .await
    }
}
