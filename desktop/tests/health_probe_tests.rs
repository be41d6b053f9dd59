//! Integration tests for the HTTP health probe using wiremock mock server

use ks_desktop::readiness::{CancelToken, HealthProbe, HttpHealthProbe, ReadinessError};

use std::time::{Duration, Instant};

use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn probe_for(server: &MockServer) -> HttpHealthProbe {
    HttpHealthProbe::new(format!("{}/health", server.uri()), PROBE_TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_health_ok_is_ready() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let probe = probe_for(&mock_server);
    assert_eq!(probe.url(), format!("{}/health", mock_server.uri()));
    let result = probe.check(&CancelToken::new()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_health_body_is_ignored() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let result = probe_for(&mock_server).check(&CancelToken::new()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_health_error_status_is_not_ready() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = probe_for(&mock_server).check(&CancelToken::new()).await;

    match result {
        Err(ReadinessError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let probe =
        HttpHealthProbe::new(format!("http://127.0.0.1:{port}/health"), PROBE_TIMEOUT).unwrap();
    let result = probe.check(&CancelToken::new()).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ReadinessError::Http { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let probe = probe_for(&mock_server);
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = probe.check(&cancel).await;

    assert!(matches!(result, Err(ReadinessError::Aborted { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_slow_backend_hits_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let probe = HttpHealthProbe::new(
        format!("{}/health", mock_server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();
    let result = probe.check(&CancelToken::new()).await;

    assert!(matches!(result, Err(ReadinessError::Http { .. })));
}
