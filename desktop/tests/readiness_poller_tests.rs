//! Readiness polling against a live HTTP endpoint

use ks_desktop::readiness::{
    BACKEND_UNAVAILABLE_MESSAGE, HttpHealthProbe, ReadinessState, observe_readiness,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const WAIT_LIMIT: Duration = Duration::from_secs(10);

async fn settled(mut rx: watch::Receiver<ReadinessState>) -> ReadinessState {
    tokio::time::timeout(WAIT_LIMIT, rx.wait_for(|s| s.ready || s.has_failed()))
        .await
        .expect("poller did not settle")
        .expect("poller dropped")
        .clone()
}

#[tokio::test]
async fn test_backend_becomes_ready_after_warmup() {
    let mock_server = MockServer::start().await;

    // Registered first so it takes precedence while it still has budget
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let probe = HttpHealthProbe::new(
        format!("{}/health", mock_server.uri()),
        Duration::from_secs(1),
    )
    .unwrap();
    let poller = observe_readiness(
        Arc::new(probe),
        Duration::from_millis(50),
        Duration::from_secs(5),
    );

    let state = settled(poller.subscribe()).await;

    assert!(state.ready);
    assert_eq!(state.attempts, 3);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_unreachable_backend_times_out() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let probe = HttpHealthProbe::new(
        format!("http://127.0.0.1:{port}/health"),
        Duration::from_millis(200),
    )
    .unwrap();
    let poller = observe_readiness(
        Arc::new(probe),
        Duration::from_millis(100),
        Duration::from_millis(300),
    );

    let state = settled(poller.subscribe()).await;

    assert!(!state.ready);
    assert_eq!(state.error.as_deref(), Some(BACKEND_UNAVAILABLE_MESSAGE));
    assert!(
        (3..=5).contains(&state.attempts),
        "attempts = {}",
        state.attempts
    );
    assert!(state.elapsed_ms >= 300);
}

#[tokio::test]
async fn test_retry_after_backend_comes_up() {
    let mock_server = MockServer::start().await;

    let probe = HttpHealthProbe::new(
        format!("{}/health", mock_server.uri()),
        Duration::from_secs(1),
    )
    .unwrap();
    let poller = observe_readiness(
        Arc::new(probe),
        Duration::from_millis(50),
        Duration::from_millis(200),
    );

    // No mock mounted yet: every request is a 404
    let failed = settled(poller.subscribe()).await;
    assert!(failed.has_failed());

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    poller.retry();

    let state = settled(poller.subscribe()).await;
    assert!(state.ready);
    assert_eq!(state.attempts, 1);
    assert_eq!(state.retry_token, 1);
}
