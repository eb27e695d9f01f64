//! In-memory host implementation for testing and development.
//!
//! This module provides a simulated host that:
//! - Signs sessions on against a table of user profiles
//! - Holds plain and keyed data queues with blocking reads
//! - Runs commands, with scripted failures and extended help text
//! - Injects faults: unreachable host, dropped connections
//!
//! This host is intended for:
//! - Unit and integration testing of runtime consumers
//! - Development without access to a real system
//! - Reference behavior for transport implementations

use crate::addressing::QueueIdentity;
use crate::search::SearchType;
use crate::transport::{
    CommandOutcome, HostConnector, HostError, HostMessage, HostSession, RawEntry, ReadMode,
    SocketProperties,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Entries of one data queue
enum StoredQueue {
    Plain(VecDeque<String>),
    Keyed {
        key_length: usize,
        entries: VecDeque<(String, String)>,
    },
}

/// A command prefix that the host reports as failed
struct ScriptedFailure {
    prefix: String,
    messages: Vec<HostMessage>,
}

/// Everything the simulated host knows
struct HostState {
    host_name: String,
    users: HashMap<String, String>,
    reachable: bool,
    liveness_check_supported: bool,
    /// Bumped whenever all connections are dropped
    generation: u64,
    queues: HashMap<String, StoredQueue>,
    unknown_libraries: HashSet<String>,
    failures: Vec<ScriptedFailure>,
    message_help: HashMap<String, String>,
    command_log: Vec<String>,
    signons: Vec<SignonRecord>,
    stats: HostStats,
}

impl HostState {
    fn new(host_name: String) -> Self {
        Self {
            host_name,
            users: HashMap::new(),
            reachable: true,
            liveness_check_supported: true,
            generation: 0,
            queues: HashMap::new(),
            unknown_libraries: HashSet::new(),
            failures: Vec::new(),
            message_help: HashMap::new(),
            command_log: Vec::new(),
            signons: Vec::new(),
            stats: HostStats::default(),
        }
    }

    fn outcome_for(&self, command: &str) -> CommandOutcome {
        if let Some(library) = command
            .strip_prefix("ADDLIBLE LIB(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            if self.unknown_libraries.contains(library) {
                return CommandOutcome::failure(vec![HostMessage::new(
                    "CPF2110",
                    format!("Library {library} not found."),
                )]);
            }
        }

        self.failures
            .iter()
            .find(|failure| command.starts_with(&failure.prefix))
            .map(|failure| CommandOutcome::failure(failure.messages.clone()))
            .unwrap_or_else(CommandOutcome::success)
    }
}

/// Counters for assertions in tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Session objects created through the connector
    pub sessions_opened: u32,
    /// Successful sign-ons
    pub signons: u32,
    /// Calls to the liveness check
    pub liveness_checks: u32,
}

/// Options a session carried when it signed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignonRecord {
    pub user: String,
    pub gui_available: bool,
    pub socket_properties: SocketProperties,
}

// ============================================================================
// InMemoryHost
// ============================================================================

/// Simulated host; clones share the same state
#[derive(Clone)]
pub struct InMemoryHost {
    state: Arc<Mutex<HostState>>,
    arrivals: Arc<Notify>,
}

impl InMemoryHost {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState::new(host_name.into()))),
            arrivals: Arc::new(Notify::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, user: impl Into<String>, password: impl Into<String>) -> &Self {
        self.lock().users.insert(user.into(), password.into());
        self
    }

    pub fn create_queue(&self, queue: &QueueIdentity) -> &Self {
        self.lock()
            .queues
            .insert(queue.path(), StoredQueue::Plain(VecDeque::new()));
        self
    }

    pub fn create_keyed_queue(&self, queue: &QueueIdentity, key_length: usize) -> &Self {
        self.lock().queues.insert(
            queue.path(),
            StoredQueue::Keyed {
                key_length,
                entries: VecDeque::new(),
            },
        );
        self
    }

    /// New sign-ons fail while the host is unreachable
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Emulate an older release without the liveness check
    pub fn set_liveness_check_supported(&self, supported: bool) {
        self.lock().liveness_check_supported = supported;
    }

    /// Break every open session. Sessions keep believing their socket is
    /// open until they try to use it.
    pub fn drop_connections(&self) {
        self.lock().generation += 1;
        self.arrivals.notify_waiters();
    }

    /// Make `ADDLIBLE` fail for this library
    pub fn remove_library(&self, library: impl Into<String>) {
        self.lock().unknown_libraries.insert(library.into());
    }

    /// Report commands starting with `prefix` as failed with these
    /// `(id, text, help)` messages
    pub fn fail_command(&self, prefix: impl Into<String>, messages: &[(&str, &str, &str)]) {
        let mut state = self.lock();
        let mut host_messages = Vec::with_capacity(messages.len());
        for (id, text, help) in messages {
            state.message_help.insert(id.to_string(), help.to_string());
            host_messages.push(HostMessage::new(*id, *text));
        }
        state.failures.push(ScriptedFailure {
            prefix: prefix.into(),
            messages: host_messages,
        });
    }

    /// Put an entry on a plain queue without a session
    pub fn push_entry(&self, queue: &QueueIdentity, data: &str) -> Result<(), HostError> {
        let path = queue.path();
        let result = match self.lock().queues.get_mut(&path) {
            Some(StoredQueue::Plain(entries)) => {
                entries.push_back(data.to_string());
                Ok(())
            }
            Some(StoredQueue::Keyed { .. }) => Err(not_plain(&path)),
            None => Err(HostError::ObjectNotFound { path }),
        };
        self.arrivals.notify_waiters();
        result
    }

    /// Entries currently on a queue, oldest first
    pub fn queue_entries(&self, queue: &QueueIdentity) -> Vec<String> {
        match self.lock().queues.get(&queue.path()) {
            Some(StoredQueue::Plain(entries)) => entries.iter().cloned().collect(),
            Some(StoredQueue::Keyed { entries, .. }) => {
                entries.iter().map(|(_, data)| data.clone()).collect()
            }
            None => Vec::new(),
        }
    }

    pub fn command_log(&self) -> Vec<String> {
        self.lock().command_log.clone()
    }

    pub fn signons(&self) -> Vec<SignonRecord> {
        self.lock().signons.clone()
    }

    pub fn stats(&self) -> HostStats {
        self.lock().stats.clone()
    }
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("InMemoryHost")
            .field("host_name", &state.host_name)
            .field("queues", &state.queues.len())
            .field("generation", &state.generation)
            .finish()
    }
}

#[async_trait]
impl HostConnector for InMemoryHost {
    async fn open(
        &self,
        host: &str,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn HostSession>, HostError> {
        let mut state = self.lock();
        if !state.host_name.eq_ignore_ascii_case(host) {
            return Err(HostError::UnknownHost {
                host: host.to_string(),
            });
        }
        state.stats.sessions_opened += 1;

        Ok(Box::new(InMemorySession {
            host: self.clone(),
            user: user.to_string(),
            password: password.to_string(),
            generation: None,
            gui_available: true,
            socket_properties: SocketProperties::default(),
            closed: false,
        }))
    }
}

// ============================================================================
// InMemorySession
// ============================================================================

/// Session against an [`InMemoryHost`]
pub struct InMemorySession {
    host: InMemoryHost,
    user: String,
    password: String,
    /// Host generation at sign-on, `None` before sign-on
    generation: Option<u64>,
    gui_available: bool,
    socket_properties: SocketProperties,
    closed: bool,
}

impl InMemorySession {
    fn ensure_live(&self, state: &HostState) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::ConnectionDropped {
                message: "session services were disconnected".to_string(),
            });
        }
        match self.generation {
            Some(generation) if generation == state.generation => Ok(()),
            Some(_) => Err(HostError::ConnectionDropped {
                message: format!("connection to {} was reset", state.host_name),
            }),
            None => Err(HostError::ConnectionDropped {
                message: "session is not signed on".to_string(),
            }),
        }
    }

    /// Retry `attempt` until it yields an entry or `wait` runs out, waking
    /// up on every write and every dropped connection.
    async fn wait_for_entry<F>(
        &self,
        wait: Duration,
        mut attempt: F,
    ) -> Result<Option<RawEntry>, HostError>
    where
        F: FnMut(&mut HostState) -> Result<Option<RawEntry>, HostError> + Send,
    {
        let deadline = Instant::now() + wait;
        let arrivals = Arc::clone(&self.host.arrivals);

        loop {
            let arrived = arrivals.notified();
            {
                let mut state = self.host.lock();
                self.ensure_live(&state)?;
                if let Some(entry) = attempt(&mut state)? {
                    return Ok(Some(entry));
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            let _ = tokio::time::timeout_at(deadline, arrived).await;
        }
    }

    fn write(&self, path: &str, key: Option<&str>, data: &str) -> Result<(), HostError> {
        {
            let mut state = self.host.lock();
            self.ensure_live(&state)?;
            match (state.queues.get_mut(path), key) {
                (None, _) => {
                    return Err(HostError::ObjectNotFound {
                        path: path.to_string(),
                    })
                }
                (Some(StoredQueue::Plain(entries)), None) => entries.push_back(data.to_string()),
                (Some(StoredQueue::Plain(_)), Some(_)) => return Err(not_keyed(path)),
                (Some(StoredQueue::Keyed { .. }), None) => return Err(not_plain(path)),
                (Some(StoredQueue::Keyed { key_length, entries }), Some(key)) => {
                    check_key_length(key, *key_length)?;
                    entries.push_back((key.to_string(), data.to_string()));
                }
            }
        }
        self.host.arrivals.notify_waiters();
        Ok(())
    }
}

fn not_keyed(path: &str) -> HostError {
    HostError::IllegalObjectType {
        path: path.to_string(),
        message: "data queue is not keyed".to_string(),
    }
}

fn not_plain(path: &str) -> HostError {
    HostError::IllegalObjectType {
        path: path.to_string(),
        message: "data queue is keyed".to_string(),
    }
}

fn check_key_length(key: &str, key_length: usize) -> Result<(), HostError> {
    let length = key.chars().count();
    if length != key_length {
        return Err(HostError::InvalidArgument {
            name: "key".to_string(),
            message: format!("length {length}, queue key length is {key_length}"),
        });
    }
    Ok(())
}

#[async_trait]
impl HostSession for InMemorySession {
    fn user_id(&self) -> &str {
        &self.user
    }

    fn set_gui_available(&mut self, available: bool) {
        self.gui_available = available;
    }

    fn set_socket_properties(&mut self, properties: SocketProperties) {
        self.socket_properties = properties;
    }

    async fn validate_signon(&mut self) -> Result<(), HostError> {
        let mut state = self.host.lock();
        if !state.reachable {
            return Err(HostError::Unreachable {
                host: state.host_name.clone(),
                message: "connection refused".to_string(),
            });
        }
        if state.users.get(&self.user) != Some(&self.password) {
            return Err(HostError::Security {
                message: format!("password or user profile {} not correct", self.user),
            });
        }

        self.generation = Some(state.generation);
        self.closed = false;
        state.stats.signons += 1;
        state.signons.push(SignonRecord {
            user: self.user.clone(),
            gui_available: self.gui_available,
            socket_properties: self.socket_properties,
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.generation.is_some() && !self.closed
    }

    fn supports_liveness_check(&self) -> bool {
        self.host.lock().liveness_check_supported
    }

    async fn is_connection_alive(&mut self) -> Result<bool, HostError> {
        let mut state = self.host.lock();
        state.stats.liveness_checks += 1;
        Ok(self.ensure_live(&state).is_ok())
    }

    async fn run_command(&mut self, command: &str) -> Result<CommandOutcome, HostError> {
        let mut state = self.host.lock();
        self.ensure_live(&state)?;
        state.command_log.push(command.to_string());
        Ok(state.outcome_for(command))
    }

    async fn load_message_help(&mut self, message: &mut HostMessage) -> Result<(), HostError> {
        let state = self.host.lock();
        self.ensure_live(&state)?;
        message.help = state.message_help.get(&message.id).cloned();
        Ok(())
    }

    async fn key_length(&mut self, path: &str) -> Result<usize, HostError> {
        let state = self.host.lock();
        self.ensure_live(&state)?;
        match state.queues.get(path) {
            Some(StoredQueue::Keyed { key_length, .. }) => Ok(*key_length),
            Some(StoredQueue::Plain(_)) => Err(not_keyed(path)),
            None => Err(HostError::ObjectNotFound {
                path: path.to_string(),
            }),
        }
    }

    async fn read_entry(
        &mut self,
        path: &str,
        wait: Duration,
        mode: ReadMode,
    ) -> Result<Option<RawEntry>, HostError> {
        self.wait_for_entry(wait, |state| match state.queues.get_mut(path) {
            Some(StoredQueue::Plain(entries)) => {
                let data = match mode {
                    ReadMode::Peek => entries.front().cloned(),
                    ReadMode::Remove => entries.pop_front(),
                };
                Ok(data.map(|data| RawEntry { data, key: None }))
            }
            Some(StoredQueue::Keyed { .. }) => Err(not_plain(path)),
            None => Err(HostError::ObjectNotFound {
                path: path.to_string(),
            }),
        })
        .await
    }

    async fn read_keyed_entry(
        &mut self,
        path: &str,
        key: &str,
        search: SearchType,
        wait: Duration,
        mode: ReadMode,
    ) -> Result<Option<RawEntry>, HostError> {
        self.wait_for_entry(wait, |state| match state.queues.get_mut(path) {
            Some(StoredQueue::Keyed { key_length, entries }) => {
                check_key_length(key, *key_length)?;
                let Some(index) = entries
                    .iter()
                    .position(|(entry_key, _)| search.matches(entry_key, key))
                else {
                    return Ok(None);
                };
                let entry = match mode {
                    ReadMode::Peek => entries.get(index).cloned(),
                    ReadMode::Remove => entries.remove(index),
                };
                Ok(entry.map(|(key, data)| RawEntry {
                    data,
                    key: Some(key),
                }))
            }
            Some(StoredQueue::Plain(_)) => Err(not_keyed(path)),
            None => Err(HostError::ObjectNotFound {
                path: path.to_string(),
            }),
        })
        .await
    }

    async fn write_entry(&mut self, path: &str, data: &str) -> Result<(), HostError> {
        self.write(path, None, data)
    }

    async fn write_keyed_entry(
        &mut self,
        path: &str,
        key: &str,
        data: &str,
    ) -> Result<(), HostError> {
        self.write(path, Some(key), data)
    }

    async fn disconnect_all_services(&mut self) {
        self.closed = true;
    }
}
