//! Tests for the polling read loop.

use super::*;
use crate::addressing::QueueIdentity;
use crate::config::ConnectionSettings;
use crate::providers::InMemoryHost;
use std::sync::Arc;

const HOST: &str = "prod400";

fn orders() -> QueueIdentity {
    QueueIdentity::new("ORDERS", "APPLIB")
}

fn test_host() -> InMemoryHost {
    let host = InMemoryHost::new(HOST);
    host.add_user("QUSER", "secret");
    host.create_queue(&orders());
    host
}

async fn connected_manager(host: &InMemoryHost) -> ConnectionManager {
    let mut manager = ConnectionManager::new(
        Arc::new(host.clone()),
        ConnectionSettings::new(HOST, "QUSER", "secret"),
    );
    manager.reconnect().await.expect("initial connect");
    manager
}

fn push_later(host: &InMemoryHost, after: Duration, data: &'static str) {
    let host = host.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        host.push_entry(&orders(), data).expect("push");
    });
}

#[tokio::test(start_paused = true)]
async fn test_bounded_wait_returns_none_only_after_full_wait() {
    let host = test_host();
    let mut manager = connected_manager(&host).await;
    let request = ReadRequest::new(orders()).with_wait(TotalWait::Bounded(Duration::from_secs(70)));
    let started = Instant::now();

    let message = PollingReadLoop::new(&mut manager, RetryPolicy::default())
        .read(&request)
        .await
        .expect("read");

    assert!(message.is_none());
    assert!(started.elapsed() >= Duration::from_secs(70));
    assert!(started.elapsed() < Duration::from_secs(71));
}

#[tokio::test(start_paused = true)]
async fn test_message_arriving_after_first_call_is_returned() {
    let host = test_host();
    let mut manager = connected_manager(&host).await;
    push_later(&host, Duration::from_secs(45), "HELLO");
    let request =
        ReadRequest::new(orders()).with_wait(TotalWait::Bounded(Duration::from_secs(120)));

    let message = PollingReadLoop::new(&mut manager, RetryPolicy::default())
        .with_max_call_wait(Duration::from_secs(30))
        .read(&request)
        .await
        .expect("read");

    assert_eq!(message.map(|m| m.payload), Some("HELLO".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_forever_wait_survives_dropped_connection() {
    let host = test_host();
    let mut manager = connected_manager(&host).await;
    let breaker = host.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(40)).await;
        breaker.drop_connections();
    });
    push_later(&host, Duration::from_secs(50), "after reconnect");
    let request = ReadRequest::new(orders());

    let message = PollingReadLoop::new(&mut manager, RetryPolicy::unbounded(Duration::ZERO))
        .read(&request)
        .await
        .expect("read");

    assert_eq!(message.map(|m| m.payload), Some("after reconnect".to_string()));
    assert_eq!(host.stats().sessions_opened, 2);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_policy_surfaces_transport_error() {
    let host = test_host();
    let mut manager = connected_manager(&host).await;
    host.drop_connections();
    host.set_reachable(false);
    let request = ReadRequest::new(orders());

    let result = PollingReadLoop::new(&mut manager, RetryPolicy::bounded(2, Duration::from_secs(1)))
        .read(&request)
        .await;

    let error = result.expect_err("reconnect cannot succeed");
    assert!(error.is_transport());
    assert_eq!(host.stats().sessions_opened, 1 + 2);
}

#[tokio::test(start_paused = true)]
async fn test_connects_before_first_read() {
    let host = test_host();
    host.push_entry(&orders(), "ready").expect("push");
    let mut manager = ConnectionManager::new(
        Arc::new(host.clone()),
        ConnectionSettings::new(HOST, "QUSER", "secret"),
    );
    let request = ReadRequest::new(orders()).with_wait(TotalWait::Bounded(Duration::ZERO));

    let message = PollingReadLoop::new(&mut manager, RetryPolicy::default())
        .read(&request)
        .await
        .expect("read");

    assert_eq!(message.map(|m| m.payload), Some("ready".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_host_fails_before_reading() {
    let host = test_host();
    host.set_reachable(false);
    let mut manager = ConnectionManager::new(
        Arc::new(host.clone()),
        ConnectionSettings::new(HOST, "QUSER", "secret"),
    );

    let result = PollingReadLoop::new(&mut manager, RetryPolicy::bounded(3, Duration::ZERO))
        .read(&ReadRequest::new(orders()))
        .await;

    let error = result.expect_err("host is unreachable");
    assert!(error.to_string().contains("after 3 attempts"));
}

#[tokio::test(start_paused = true)]
async fn test_host_rejection_is_returned_without_reconnect() {
    let host = test_host();
    let mut manager = connected_manager(&host).await;
    let request = ReadRequest::new(QueueIdentity::new("MISSING", "APPLIB"));

    let result = PollingReadLoop::new(&mut manager, RetryPolicy::default())
        .read(&request)
        .await;

    assert!(matches!(result, Err(DataqError::Read { .. })));
    assert_eq!(host.stats().sessions_opened, 1);
}

#[test]
fn test_call_wait_is_capped() {
    let host = test_host();
    let mut manager = ConnectionManager::new(
        Arc::new(host),
        ConnectionSettings::new(HOST, "QUSER", "secret"),
    );
    let reader = PollingReadLoop::new(&mut manager, RetryPolicy::default());

    assert_eq!(reader.call_wait(TotalWait::Forever, Duration::ZERO), MAX_QUEUE_WAIT);
    assert_eq!(
        reader.call_wait(TotalWait::Bounded(Duration::from_secs(45)), Duration::from_secs(20)),
        Duration::from_secs(25)
    );
    assert_eq!(
        reader.call_wait(TotalWait::Bounded(Duration::from_secs(10)), Duration::from_secs(20)),
        Duration::ZERO
    );
}
