//! Remote command execution.

use crate::error::{CommandError, DataqError, TransportError};
use crate::transport::{HostError, HostMessage, HostSession};
use tracing::{debug, error, warn};

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

/// Makes the job answer inquiry messages with their default reply instead
/// of waiting for an operator
pub const INQUIRY_REPLY_COMMAND: &str = "CHGJOB INQMSGRPY(*DFT)";

/// Command adding one library to the job's library list
pub fn add_library_command(library: &str) -> String {
    format!("ADDLIBLE LIB({library})")
}

/// Runs commands through a live session
pub struct CommandExecutor<'a> {
    session: &'a mut dyn HostSession,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(session: &'a mut dyn HostSession) -> Self {
        Self { session }
    }

    /// Run `command` unattended.
    ///
    /// A host-reported failure becomes a [`CommandError`] carrying every
    /// diagnostic with its extended help; a lost connection becomes a
    /// [`TransportError`].
    pub async fn run(&mut self, command: &str) -> Result<(), DataqError> {
        match self.session.run_command(INQUIRY_REPLY_COMMAND).await {
            Ok(outcome) if !outcome.succeeded => {
                warn!(
                    messages = outcome.messages.len(),
                    "Could not switch inquiry messages to default replies"
                );
            }
            Ok(_) => {}
            Err(e) => return Err(classify_host_error(INQUIRY_REPLY_COMMAND, e)),
        }

        let outcome = self
            .session
            .run_command(command)
            .await
            .map_err(|e| classify_host_error(command, e))?;

        if outcome.succeeded {
            debug!(command, "Command call completed");
            return Ok(());
        }

        Err(host_failure(&mut *self.session, command, outcome.messages).await)
    }
}

/// Tag a failure raised while sending a command
pub(crate) fn classify_host_error(command: &str, error: HostError) -> DataqError {
    if error.is_connection_loss() {
        let message = format!("Command call connection error running '{command}'");
        TransportError::with_cause(message, error).into()
    } else {
        CommandError::rejected(command, error).into()
    }
}

/// Load extended help for each diagnostic and fold them into one error
pub(crate) async fn host_failure(
    session: &mut dyn HostSession,
    command: &str,
    mut messages: Vec<HostMessage>,
) -> DataqError {
    for message in &mut messages {
        if let Err(e) = session.load_message_help(message).await {
            if e.is_connection_loss() {
                return classify_host_error(command, e);
            }
            debug!(message_id = %message.id, error = %e, "Extended help not available");
        }
    }

    let failure = CommandError::from_diagnostics(command, messages);
    error!(command, report = %failure.report, "Command call ended in error");
    failure.into()
}
