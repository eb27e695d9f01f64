//! Error types for connections, data queue operations and commands.

use crate::transport::{HostError, HostMessage};
use thiserror::Error;

/// Comprehensive error type for all runtime operations
#[derive(Debug, Error)]
pub enum DataqError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Data queue read failed on {queue}: {source}")]
    Read {
        queue: String,
        #[source]
        source: HostError,
    },

    #[error("Data queue write failed on {queue}: {source}")]
    Write {
        queue: String,
        #[source]
        source: HostError,
    },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl DataqError {
    /// Check if the error came from a lost connection
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if the caller should reconnect before trying again.
    ///
    /// Bad credentials and rejected requests are never worth a reconnect.
    pub fn should_reconnect(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Connect(e) => matches!(
                e.kind(),
                ConnectFailure::UnknownHost | ConnectFailure::CannotReach
            ),
            Self::Read { .. } => false,
            Self::Write { .. } => false,
            Self::Command(_) => false,
            Self::Configuration(_) => false,
        }
    }
}

/// Loss of the session or socket during an operation
#[derive(Debug, Error)]
#[error("{message}{}", render_cause(.cause))]
pub struct TransportError {
    message: String,
    #[source]
    cause: Option<HostError>,
}

fn render_cause(cause: &Option<HostError>) -> String {
    match cause {
        Some(cause) => format!(": {cause}"),
        None => String::new(),
    }
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: HostError) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&HostError> {
        self.cause.as_ref()
    }
}

/// Classification of a failed connect, for caller-facing diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    UnknownHost,
    CannotReach,
    IncorrectCredentials,
    CommandFailed,
    Unexpected,
}

/// Errors raised while establishing a session
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Unknown host {host}: {source}")]
    UnknownHost {
        host: String,
        #[source]
        source: HostError,
    },

    #[error("Cannot reach {host}: {source}")]
    CannotReach {
        host: String,
        #[source]
        source: HostError,
    },

    #[error("Incorrect credentials for {user} on {host}: {source}")]
    IncorrectCredentials {
        host: String,
        user: String,
        #[source]
        source: HostError,
    },

    #[error("Library list setup failed on {host}: {source}")]
    Command {
        host: String,
        #[source]
        source: Box<DataqError>,
    },

    #[error("Unexpected failure connecting to {host}: {source}")]
    Unexpected {
        host: String,
        #[source]
        source: HostError,
    },
}

impl ConnectError {
    /// Classify a transport failure raised while opening or signing on
    pub fn from_host(host: &str, user: &str, source: HostError) -> Self {
        let host = host.to_string();
        match source {
            HostError::UnknownHost { .. } => Self::UnknownHost { host, source },
            HostError::Security { .. } => Self::IncorrectCredentials {
                host,
                user: user.to_string(),
                source,
            },
            HostError::Unreachable { .. }
            | HostError::ConnectionDropped { .. }
            | HostError::Io(_) => Self::CannotReach { host, source },
            other => Self::Unexpected {
                host,
                source: other,
            },
        }
    }

    pub fn kind(&self) -> ConnectFailure {
        match self {
            Self::UnknownHost { .. } => ConnectFailure::UnknownHost,
            Self::CannotReach { .. } => ConnectFailure::CannotReach,
            Self::IncorrectCredentials { .. } => ConnectFailure::IncorrectCredentials,
            Self::Command { .. } => ConnectFailure::CommandFailed,
            Self::Unexpected { .. } => ConnectFailure::Unexpected,
        }
    }
}

/// A command the host ran and reported as failed
#[derive(Debug, Error)]
#[error("Command '{command}' failed:\n{report}")]
pub struct CommandError {
    pub command: String,
    /// Host messages in the order the host reported them
    pub diagnostics: Vec<HostMessage>,
    /// Multi-line text built from the diagnostics
    pub report: String,
    #[source]
    pub cause: Option<HostError>,
}

impl CommandError {
    /// Build the error from the diagnostics attached to a failed run
    pub fn from_diagnostics(command: impl Into<String>, diagnostics: Vec<HostMessage>) -> Self {
        let mut report = String::from("Command call ended in error, host messages follow:\n");
        for message in &diagnostics {
            report.push_str(&format!("ERROR {}: {}\n", message.id, message.text));
            if let Some(help) = &message.help {
                report.push_str(&format!("  details: {help}\n"));
            }
        }

        Self {
            command: command.into(),
            diagnostics,
            report,
            cause: None,
        }
    }

    /// Build the error from a request the host refused outright
    pub fn rejected(command: impl Into<String>, cause: HostError) -> Self {
        Self {
            command: command.into(),
            diagnostics: Vec::new(),
            report: format!("Command call error: {cause}"),
            cause: Some(cause),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        Self::Parsing {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
