//! End-to-end tests for the fetch-parse pipeline against a local HTTP server

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::time::Instant;
use weatherstation::domain::types::Measurement;
use weatherstation::infra::Metrics;
use weatherstation::io::{FetchError, StationClient, StationConfig};
use weatherstation::services::{RefreshOutcome, Refresher};

const FIXTURE: &str =
    r#"{"dateandtime":[1000,2000],"temperature":[20.5,21.0],"humidity":[50.0,51.2]}"#;

/// Serve a fixed response on an ephemeral port; records the last query string
async fn serve_fixed(
    status: StatusCode,
    body: &'static str,
) -> (SocketAddr, Arc<Mutex<Option<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen_query = Arc::new(Mutex::new(None));

    let seen = seen_query.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let io = TokioIo::new(stream);
            let seen = seen.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let seen = seen.clone();
                    async move {
                        *seen.lock().unwrap() = req.uri().query().map(|q| q.to_string());
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .body(Full::new(Bytes::from(body)))
                                .unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    (addr, seen_query)
}

fn client_for(addr: SocketAddr) -> StationClient {
    let config = StationConfig {
        url: format!("http://{}/indexjson.php", addr),
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    StationClient::new(config).unwrap()
}

fn refresher_for(addr: SocketAddr) -> (Refresher, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    let (refresher, _handle) = Refresher::new(client_for(addr), 60, metrics.clone());
    (refresher, metrics)
}

#[tokio::test]
async fn test_end_to_end_fixture() {
    let (addr, seen_query) = serve_fixed(StatusCode::OK, FIXTURE).await;
    let client = client_for(addr);

    let raw = client.fetch().await.unwrap();
    let batch = weatherstation::domain::parse_series(&raw).unwrap();

    assert_eq!(
        batch.as_slice(),
        &[
            Measurement { timestamp_ms: 1_000_000, temperature: 20.5, humidity: 50.0 },
            Measurement { timestamp_ms: 2_000_000, temperature: 21.0, humidity: 51.2 },
        ]
    );

    let query = seen_query.lock().unwrap().clone().expect("server saw no query");
    assert!(query.contains("hours=24"));
    assert!(query.contains("maxpts=2000"));
}

#[tokio::test]
async fn test_non_success_status_is_a_fetch_error() {
    let (addr, _) = serve_fixed(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let client = client_for(addr);

    match client.fetch().await {
        Err(FetchError::Status(status)) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR.as_u16());
        }
        other => panic!("expected status error, got {:?}", other.map(|_| "body")),
    }
}

#[tokio::test]
async fn test_fetch_timeout_is_bounded_and_releases_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept, read the request, never answer; report when the client hangs up
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = closed_tx.send(());
    });

    let config = StationConfig {
        url: format!("http://{}/indexjson.php", addr),
        connect_timeout: Duration::from_secs(1),
        read_timeout: Duration::from_millis(300),
        ..Default::default()
    };
    let client = StationClient::new(config).unwrap();

    let started = Instant::now();
    let err = client.fetch().await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5), "timeout was not bounded");
    match err {
        FetchError::Network(e) => assert!(e.is_timeout(), "expected timeout, got {}", e),
        other => panic!("expected network error, got {}", other),
    }

    // The timed-out connection must be torn down, not left dangling
    drop(client);
    tokio::time::timeout(Duration::from_secs(5), closed_rx)
        .await
        .expect("connection was not released")
        .unwrap();
}

#[tokio::test]
async fn test_cycle_delivers_batch_and_records_metrics() {
    let (addr, _) = serve_fixed(StatusCode::OK, FIXTURE).await;
    let (refresher, metrics) = refresher_for(addr);

    let first = refresher.run_cycle().await;
    let second = refresher.run_cycle().await;

    // Same raw text, structurally equal batches
    assert_eq!(first, second);
    match first {
        RefreshOutcome::Updated(batch) => {
            assert_eq!(batch.len(), 2);
            assert_eq!(batch.latest().unwrap().timestamp_ms, 2_000_000);
        }
        other => panic!("expected updated batch, got {:?}", other),
    }

    let summary = metrics.report();
    assert_eq!(summary.cycles_total, 2);
    assert_eq!(summary.points_last, 2);
    assert_eq!(summary.fetch_failures, 0);
    assert_eq!(summary.parse_failures, 0);
}

#[tokio::test]
async fn test_cycle_empty_body_fails_without_panic() {
    let (addr, _) = serve_fixed(StatusCode::OK, "").await;
    let (refresher, metrics) = refresher_for(addr);

    match refresher.run_cycle().await {
        RefreshOutcome::Failed(cause) => assert!(cause.contains("empty")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(metrics.report().parse_failures, 1);
}

#[tokio::test]
async fn test_cycle_empty_series_is_no_data() {
    let (addr, _) = serve_fixed(
        StatusCode::OK,
        r#"{"dateandtime":[],"temperature":[],"humidity":[]}"#,
    )
    .await;
    let (refresher, metrics) = refresher_for(addr);

    assert_eq!(refresher.run_cycle().await, RefreshOutcome::NoData);
    assert_eq!(metrics.report().empty_batches, 1);
}

#[tokio::test]
async fn test_cycle_malformed_payload_fails_without_panic() {
    let (addr, _) = serve_fixed(
        StatusCode::OK,
        r#"{"dateandtime":[1000,2000],"temperature":[20.5],"humidity":[50.0,51.2]}"#,
    )
    .await;
    let (refresher, metrics) = refresher_for(addr);

    match refresher.run_cycle().await {
        RefreshOutcome::Failed(cause) => assert!(cause.contains("length mismatch")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(metrics.report().parse_failures, 1);
}
