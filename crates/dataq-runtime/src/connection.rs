//! Connection lifecycle: sign-on, cached health checks and reconnect loops.
//!
//! A [`ConnectionManager`] owns at most one [`SessionHandle`]. Health checks
//! are cached for a keep-alive interval so that a burst of queue calls does
//! not turn into a burst of round trips; once the interval has passed the
//! next check asks the host. Sessions only leave the manager through
//! [`ConnectionManager::checked_session`], which runs that check first.

use crate::command::{add_library_command, classify_host_error, host_failure};
use crate::config::ConnectionSettings;
use crate::error::{ConnectError, TransportError};
use crate::retry::RetryPolicy;
use crate::session::SessionHandle;
use crate::transport::{HostConnector, HostError, HostSession, SocketProperties};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

/// Interval during which a passed health check is trusted
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Harmless command used to force a round trip on hosts without a
/// liveness check
pub const KEEP_ALIVE_COMMAND: &str = "CHGJOB";

/// Owns the session with one host
pub struct ConnectionManager {
    connector: Arc<dyn HostConnector>,
    settings: ConnectionSettings,
    handle: Option<SessionHandle>,
    keep_alive: Duration,
}

impl ConnectionManager {
    /// Create a manager; nothing is opened until a connect
    pub fn new(connector: Arc<dyn HostConnector>, settings: ConnectionSettings) -> Self {
        Self {
            connector,
            settings,
            handle: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn host(&self) -> &str {
        &self.settings.host
    }

    pub fn session_handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    /// User profile of the live session
    pub fn connection_id(&self) -> Option<&str> {
        self.handle.as_ref().map(SessionHandle::user_id)
    }

    /// Replace the connection settings and sign on with them
    pub async fn connect(&mut self, settings: ConnectionSettings) -> Result<(), ConnectError> {
        self.disconnect().await;
        self.settings = settings;
        self.establish().await
    }

    /// Sign on with the stored settings
    pub async fn reconnect(&mut self) -> Result<(), ConnectError> {
        self.disconnect().await;
        self.establish().await
    }

    async fn establish(&mut self) -> Result<(), ConnectError> {
        let started = Instant::now();
        let settings = &self.settings;
        let host = settings.host.as_str();
        let user = settings.user.as_str();

        debug!(host, user, "Opening host session");
        let mut session = self
            .connector
            .open(host, user, settings.password.expose_secret())
            .await
            .map_err(|e| ConnectError::from_host(host, user, e))?;

        session.set_gui_available(false);
        session.set_socket_properties(SocketProperties { keep_alive: true });

        if let Err(e) = session.validate_signon().await {
            session.disconnect_all_services().await;
            return Err(ConnectError::from_host(host, user, e));
        }

        for library in &settings.library_list {
            let command = add_library_command(library);
            let failure = match session.run_command(&command).await {
                Ok(outcome) if outcome.succeeded => None,
                Ok(outcome) => {
                    Some(host_failure(session.as_mut(), &command, outcome.messages).await)
                }
                Err(e) => Some(classify_host_error(&command, e)),
            };

            if let Some(source) = failure {
                warn!(host, library = %library, error = %source, "Library list setup failed");
                session.disconnect_all_services().await;
                return Err(ConnectError::Command {
                    host: host.to_string(),
                    source: Box::new(source),
                });
            }
        }

        let handle = SessionHandle::new(session, started);
        info!(
            host,
            user,
            session_id = %handle.session_id(),
            libraries = settings.library_list.len(),
            "Connected to host"
        );
        self.handle = Some(handle);
        Ok(())
    }

    /// Check the session, probing the host at most once per keep-alive
    /// interval. A failed check leaves the session in place for the caller
    /// to tear down.
    pub async fn is_connected(&mut self) -> bool {
        let keep_alive = self.keep_alive;
        let host = self.settings.host.as_str();
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };

        if let Some(checked_at) = handle.last_health_check {
            if checked_at.elapsed() <= keep_alive {
                return true;
            }
        }

        let connected = match check_liveness(handle.session.as_mut()).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    host,
                    session_id = %handle.session_id(),
                    "Host connection check: session is not alive"
                );
                false
            }
            Err(e) => {
                warn!(
                    host,
                    session_id = %handle.session_id(),
                    error = %e,
                    "Host connection check failed"
                );
                false
            }
        };
        handle.last_health_check = Some(Instant::now());
        connected
    }

    /// Make the next [`ConnectionManager::is_connected`] ask the host
    pub fn expire_health_check(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.last_health_check = None;
        }
    }

    /// Reconnect until connected or the policy runs out of attempts.
    ///
    /// Never fails by itself; callers check [`ConnectionManager::is_connected`]
    /// afterwards.
    pub async fn validate_or_reconnect(&mut self, policy: &RetryPolicy) {
        let mut attempts: u32 = 0;
        while !self.is_connected().await && policy.allows_attempt(attempts) {
            attempts = attempts.saturating_add(1);
            match self.reconnect().await {
                Ok(()) => {
                    info!(host = %self.settings.host, attempt = attempts, "Reconnected to host");
                }
                Err(e) => {
                    warn!(
                        host = %self.settings.host,
                        attempt = attempts,
                        failure = ?e.kind(),
                        error = %e,
                        "Can't reconnect to host"
                    );
                    if !policy.wait_between_attempts.is_zero() {
                        tokio::time::sleep(policy.wait_between_attempts).await;
                    }
                }
            }
        }
    }

    /// Distrust the cached health check and reconnect if the host check fails
    pub async fn force_reconnect(&mut self, policy: &RetryPolicy) {
        self.expire_health_check();
        self.validate_or_reconnect(policy).await;
    }

    /// Hand out the session after a health check
    pub async fn checked_session(&mut self) -> Result<&mut dyn HostSession, TransportError> {
        if !self.is_connected().await {
            return Err(TransportError::new(format!(
                "No live session to {}",
                self.settings.host
            )));
        }

        match self.handle.as_mut() {
            Some(handle) => Ok(handle.session.as_mut()),
            None => Err(TransportError::new(format!(
                "No live session to {}",
                self.settings.host
            ))),
        }
    }

    /// Tear down the session if there is one
    pub async fn disconnect(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.session.disconnect_all_services().await;
            info!(
                host = %self.settings.host,
                session_id = %handle.session_id(),
                "Disconnected from host"
            );
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("settings", &self.settings)
            .field("handle", &self.handle)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

async fn check_liveness(session: &mut dyn HostSession) -> Result<bool, HostError> {
    if !session.is_connected() {
        return Ok(false);
    }

    if session.supports_liveness_check() {
        session.is_connection_alive().await
    } else {
        session.run_command(KEEP_ALIVE_COMMAND).await.map(|_| true)
    }
}
