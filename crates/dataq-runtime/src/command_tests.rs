//! Tests for command execution.

use super::*;
use crate::providers::InMemoryHost;

const HOST: &str = "prod400";

async fn session_on(host: &InMemoryHost) -> Box<dyn HostSession> {
    use crate::transport::HostConnector;

    host.add_user("QUSER", "secret");
    let mut session = host.open(HOST, "QUSER", "secret").await.expect("open");
    session.validate_signon().await.expect("sign-on");
    session
}

#[test]
fn test_add_library_command_format() {
    assert_eq!(add_library_command("APPLIB"), "ADDLIBLE LIB(APPLIB)");
}

#[tokio::test]
async fn test_successful_run_sets_inquiry_reply_first() {
    let host = InMemoryHost::new(HOST);
    let mut session = session_on(&host).await;

    let result = CommandExecutor::new(session.as_mut()).run("CRTLIB LIB(NEWLIB)").await;

    assert!(result.is_ok());
    assert_eq!(
        host.command_log(),
        vec![INQUIRY_REPLY_COMMAND, "CRTLIB LIB(NEWLIB)"]
    );
}

#[tokio::test]
async fn test_failure_aggregates_messages_in_order() {
    let host = InMemoryHost::new(HOST);
    host.fail_command(
        "CPYF",
        &[
            ("CPF2817", "Copy command ended because of error.", "See previous messages."),
            ("CPF2802", "File FROMF in library QGPL not found.", "Specify an existing file."),
        ],
    );
    let mut session = session_on(&host).await;

    let result = CommandExecutor::new(session.as_mut())
        .run("CPYF FROMFILE(QGPL/FROMF) TOFILE(QGPL/TOF)")
        .await;

    let Err(DataqError::Command(failure)) = result else {
        panic!("expected a command failure");
    };
    let ids: Vec<&str> = failure.diagnostics.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["CPF2817", "CPF2802"]);
    assert_eq!(
        failure.report,
        "Command call ended in error, host messages follow:\n\
         ERROR CPF2817: Copy command ended because of error.\n  \
         details: See previous messages.\n\
         ERROR CPF2802: File FROMF in library QGPL not found.\n  \
         details: Specify an existing file.\n"
    );
    assert!(failure.cause.is_none());
}

#[tokio::test]
async fn test_inquiry_reply_failure_does_not_stop_command() {
    let host = InMemoryHost::new(HOST);
    host.fail_command(INQUIRY_REPLY_COMMAND, &[("CPF1321", "Job not found.", "")]);
    let mut session = session_on(&host).await;

    let result = CommandExecutor::new(session.as_mut()).run("DLTLIB LIB(OLDLIB)").await;

    assert!(result.is_ok());
    assert_eq!(host.command_log().len(), 2);
}

#[tokio::test]
async fn test_lost_connection_is_transport_error() {
    let host = InMemoryHost::new(HOST);
    let mut session = session_on(&host).await;
    host.drop_connections();

    let result = CommandExecutor::new(session.as_mut()).run("DSPJOB").await;

    let error = result.expect_err("dropped connection should fail");
    assert!(error.is_transport());
    assert!(error.should_reconnect());
}

#[test]
fn test_rejected_request_is_not_transport() {
    let error = classify_host_error(
        "SNDMSG",
        HostError::InvalidArgument {
            name: "command".to_string(),
            message: "too long".to_string(),
        },
    );

    assert!(!error.is_transport());
    let DataqError::Command(failure) = error else {
        panic!("expected a command error");
    };
    assert_eq!(failure.command, "SNDMSG");
    assert!(failure.report.contains("too long"));
    assert!(failure.cause.is_some());
}

#[test]
fn test_connection_loss_is_transport() {
    let error = classify_host_error(
        "SNDMSG",
        HostError::ConnectionDropped {
            message: "reset".to_string(),
        },
    );

    assert!(error.is_transport());
    assert!(error.to_string().contains("SNDMSG"));
}
