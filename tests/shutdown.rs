use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use ifttt_remote::shutdown::{
    supervise, RunningFlag, ServerHandle, ShutdownReason, ShutdownSignal,
};

async fn spawn_server(running: RunningFlag) -> ServerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let app = Router::new().route("/", get(|| async { "ok" }));
    ServerHandle::spawn(listener, app, running).unwrap()
}

#[test]
fn signal_starts_clear() {
    assert!(!ShutdownSignal::new().is_requested());
}

#[test]
fn signal_is_monotonic_and_first_request_wins() {
    let signal = ShutdownSignal::new();
    let shared = signal.clone();
    assert!(signal.request());
    assert!(!shared.request());
    assert!(shared.is_requested());
    assert!(signal.is_requested());
}

#[tokio::test]
async fn wait_returns_immediately_when_already_requested() {
    let signal = ShutdownSignal::new();
    signal.request();
    tokio::time::timeout(Duration::from_millis(100), signal.wait())
        .await
        .expect("wait should resolve");
}

#[tokio::test]
async fn wait_wakes_on_request_from_another_task() {
    let signal = ShutdownSignal::new();
    let waiter = {
        let signal = signal.clone();
        tokio::spawn(async move { signal.wait().await })
    };
    tokio::task::yield_now().await;
    signal.request();
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should wake")
        .unwrap();
}

#[tokio::test]
async fn spawn_marks_server_running_and_stop_clears_it() {
    let running = RunningFlag::new();
    let server = spawn_server(running.clone()).await;
    assert!(running.is_set());
    server.stop().await;
    assert!(!running.is_set());
}

#[tokio::test]
async fn stop_lets_an_in_flight_request_finish() {
    let entered = Arc::new(Notify::new());
    let app = Router::new().route(
        "/slow",
        get({
            let entered = entered.clone();
            move || async move {
                entered.notify_one();
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let running = RunningFlag::new();
    let server = ServerHandle::spawn(listener, app, running.clone()).unwrap();

    let url = format!("http://{}/slow", server.local_addr());
    let client = tokio::spawn(async move { reqwest::get(url).await?.text().await });

    entered.notified().await;
    server.stop().await;

    let body = tokio::time::timeout(Duration::from_secs(5), client)
        .await
        .expect("client should get an answer")
        .unwrap()
        .unwrap();
    assert_eq!(body, "done");
    assert!(!running.is_set());
}

#[tokio::test]
async fn supervise_stops_server_after_exit() {
    let running = RunningFlag::new();
    let server = spawn_server(running.clone()).await;
    let addr = server.local_addr();
    let signal = ShutdownSignal::new();

    let requester = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        requester.request();
    });

    let reason = tokio::time::timeout(
        Duration::from_secs(5),
        supervise(&signal, server, std::future::pending(), Duration::from_secs(60)),
    )
    .await
    .expect("supervisor should return promptly after exit");

    assert_eq!(reason, ShutdownReason::ExitRequested);
    assert!(!running.is_set());
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn supervise_reports_external_abort() {
    let running = RunningFlag::new();
    let server = spawn_server(running.clone()).await;
    let signal = ShutdownSignal::new();

    let reason = supervise(&signal, server, async {}, Duration::from_secs(60)).await;

    assert_eq!(reason, ShutdownReason::Aborted);
    assert!(!running.is_set());
    assert!(!signal.is_requested());
}

#[tokio::test]
async fn exit_racing_abort_counts_as_exit() {
    let server = spawn_server(RunningFlag::new()).await;
    let signal = ShutdownSignal::new();
    signal.request();

    let reason = supervise(&signal, server, async {}, Duration::from_secs(60)).await;
    assert_eq!(reason, ShutdownReason::ExitRequested);
}

#[tokio::test]
async fn signal_raised_before_supervise_is_seen() {
    let server = spawn_server(RunningFlag::new()).await;
    let signal = ShutdownSignal::new();
    signal.request();
    let reason = tokio::time::timeout(
        Duration::from_secs(1),
        supervise(&signal, server, std::future::pending(), Duration::from_millis(10)),
    )
    .await
    .unwrap();
    assert_eq!(reason, ShutdownReason::ExitRequested);
}
