//! Tests for error types.

use super::*;

fn dropped() -> HostError {
    HostError::ConnectionDropped {
        message: "socket closed by peer".to_string(),
    }
}

#[test]
fn test_error_reconnect_classification() {
    assert!(DataqError::Transport(TransportError::new("connection dropped")).should_reconnect());

    assert!(!DataqError::Read {
        queue: "/QSYS.LIB/APP.LIB/ORDERS.DTAQ".to_string(),
        source: HostError::ObjectNotFound {
            path: "/QSYS.LIB/APP.LIB/ORDERS.DTAQ".to_string(),
        },
    }
    .should_reconnect());

    assert!(!DataqError::Command(CommandError::from_diagnostics("DLTF FILE(X)", Vec::new()))
        .should_reconnect());

    let credentials = ConnectError::from_host(
        "host",
        "QUSER",
        HostError::Security {
            message: "password not correct".to_string(),
        },
    );
    assert!(!DataqError::Connect(credentials).should_reconnect());

    let unreachable = ConnectError::from_host("host", "QUSER", dropped());
    assert!(DataqError::Connect(unreachable).should_reconnect());

    let unknown = ConnectError::from_host(
        "nowhere",
        "QUSER",
        HostError::UnknownHost {
            host: "nowhere".to_string(),
        },
    );
    assert_eq!(unknown.kind(), ConnectFailure::UnknownHost);
    assert!(DataqError::Connect(unknown).should_reconnect());
}

#[test]
fn test_is_transport_only_for_transport_variant() {
    assert!(DataqError::Transport(TransportError::new("x")).is_transport());
    assert!(!DataqError::Configuration(ConfigurationError::Missing {
        key: "host".to_string()
    })
    .is_transport());
}

#[test]
fn test_transport_error_display_includes_cause() {
    let bare = TransportError::new("no active session");
    assert_eq!(bare.to_string(), "no active session");
    assert!(bare.cause().is_none());

    let caused = TransportError::with_cause("data queue read lost its connection", dropped());
    assert_eq!(
        caused.to_string(),
        "data queue read lost its connection: Connection dropped: socket closed by peer"
    );
    assert!(caused.cause().is_some());
}

#[test]
fn test_connect_error_kinds() {
    let cases = vec![
        (
            HostError::UnknownHost {
                host: "nowhere".to_string(),
            },
            ConnectFailure::UnknownHost,
        ),
        (
            HostError::Unreachable {
                host: "host".to_string(),
                message: "connection refused".to_string(),
            },
            ConnectFailure::CannotReach,
        ),
        (
            HostError::Security {
                message: "profile disabled".to_string(),
            },
            ConnectFailure::IncorrectCredentials,
        ),
        (
            HostError::Rejected {
                message: "server job limit reached".to_string(),
            },
            ConnectFailure::Unexpected,
        ),
    ];

    for (source, expected) in cases {
        assert_eq!(ConnectError::from_host("host", "QUSER", source).kind(), expected);
    }

    let command = ConnectError::Command {
        host: "host".to_string(),
        source: Box::new(DataqError::Transport(TransportError::new("dropped"))),
    };
    assert_eq!(command.kind(), ConnectFailure::CommandFailed);
}

#[test]
fn test_command_error_report_has_one_entry_per_diagnostic() {
    let mut first = HostMessage::new("CPF2110", "Library NOPE not found.");
    first.help = Some("Cause . . . : Library NOPE does not exist.".to_string());
    let second = HostMessage::new("CPF2105", "Object X in QGPL type *FILE not found.");

    let error = CommandError::from_diagnostics("DLTF FILE(QGPL/X)", vec![first, second]);

    let lines: Vec<&str> = error
        .report
        .lines()
        .filter(|line| line.starts_with("ERROR "))
        .collect();
    assert_eq!(
        lines,
        vec![
            "ERROR CPF2110: Library NOPE not found.",
            "ERROR CPF2105: Object X in QGPL type *FILE not found.",
        ]
    );
    assert!(error.report.contains("details: Cause . . . : Library NOPE does not exist."));
    assert!(error.to_string().contains("DLTF FILE(QGPL/X)"));
}

#[test]
fn test_configuration_error_from_config_crate() {
    let error: ConfigurationError = config::ConfigError::NotFound("host".to_string()).into();
    assert!(matches!(error, ConfigurationError::Parsing { .. }));
}
