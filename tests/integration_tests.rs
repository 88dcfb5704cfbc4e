//! Integration tests using wiremock to simulate HTTP servers.

mod common;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use steadycall::{CancelSignal, Error, ErrorKind, Executor, ExecutorConfig, HttpRequest};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

fn executor(timeout: Duration, retry: usize, retry_wait: Duration) -> Executor {
    Executor::builder()
        .timeout(timeout)
        .retry(retry)
        .retry_wait(retry_wait)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_successful_get_request() {
    common::init_tracing();
    let mock_server = MockServer::start().await;

    let response_data = TestData {
        id: 1,
        name: "Test".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_data))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_secs(5), 3, Duration::from_millis(10));
    let request = HttpRequest::get(format!("{}/abc", mock_server.uri())).unwrap();

    let response = executor.execute(None, request).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.attempts(), 1);
    assert!(!response.was_retried());
    assert_eq!(response.json::<TestData>().await.unwrap(), response_data);
}

#[tokio::test]
async fn test_headers_query_and_json_body_are_sent() {
    let mock_server = MockServer::start().await;

    let payload = TestData {
        id: 7,
        name: "New".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(query_param("dry_run", "true"))
        .and(header("x-request-source", "tests"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_secs(5), 0, Duration::ZERO);
    let request = HttpRequest::post(format!("{}/items", mock_server.uri()))
        .unwrap()
        .with_query_param("dry_run", "true")
        .with_header("x-request-source", "tests")
        .unwrap()
        .with_json(&payload)
        .unwrap();

    let response = executor.execute(None, request).await.unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/abc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("  database unavailable\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_secs(5), 3, Duration::from_millis(100));
    let request = HttpRequest::get(format!("{}/abc", mock_server.uri())).unwrap();

    let start = Instant::now();
    let result = executor.execute(None, request).await;

    assert!(start.elapsed() < Duration::from_millis(100));
    match result {
        Err(Error::Status {
            status, body, url, ..
        }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body.as_deref(), Some("database unavailable"));
            assert_eq!(url.path(), "/abc");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_secs(5), 3, Duration::from_millis(10));
    let request = HttpRequest::get(format!("{}/missing", mock_server.uri())).unwrap();
    let signal = CancelSignal::with_timeout(Duration::from_secs(5));

    let result = executor.execute(Some(&signal), request).await;

    match result {
        Err(Error::Status { status, body, .. }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, None);
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_query_is_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sleep"))
        .and(query_param("time", "abc"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_secs(5), 3, Duration::from_millis(10));
    let request = HttpRequest::get(format!("{}/sleep", mock_server.uri()))
        .unwrap()
        .with_query_param("time", "abc");

    let err = executor.execute(None, request).await.unwrap_err();
    assert!(err.is_status_error());
    assert_eq!(err.kind(), ErrorKind::Application);
}

#[tokio::test]
async fn test_timeout_then_success_replays_request() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First request stalls past the attempt timeout, the retry answers at once.
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                ResponseTemplate::new(200).set_delay(Duration::from_secs(2))
            } else {
                ResponseTemplate::new(200).set_body_string("accepted")
            }
        })
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_millis(100), 3, Duration::from_millis(10));
    let request = HttpRequest::post(format!("{}/orders", mock_server.uri()))
        .unwrap()
        .with_body("order=42");

    let response = executor.execute(None, request).await.unwrap();

    assert_eq!(response.attempts(), 2);
    assert!(response.was_retried());
    assert_eq!(response.text().await.unwrap(), "accepted");

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, b"order=42");
    assert_eq!(received[1].body, b"order=42");
}

#[tokio::test]
async fn test_persistent_timeouts_exhaust_retries() {
    common::init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_millis(100), 3, Duration::from_millis(100));
    let request = HttpRequest::get(format!("{}/slow", mock_server.uri())).unwrap();

    let start = Instant::now();
    let result = executor.execute(None, request).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(700) && elapsed < Duration::from_millis(850),
        "Expected about 700ms, got {:?}",
        elapsed
    );
    match result {
        Err(Error::MaxRetriesExceeded {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 4);
            assert!(matches!(*last_error, Error::Timeout(_)));
        }
        other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_short_retry_wait_exhaustion_timing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_millis(100), 3, Duration::from_millis(1));
    let request = HttpRequest::get(format!("{}/slow", mock_server.uri())).unwrap();

    let start = Instant::now();
    let err = executor.execute(None, request).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(!err.is_status_error());
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(
        elapsed >= Duration::from_millis(403) && elapsed < Duration::from_millis(583),
        "Expected about 403ms, got {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_connection_refused_is_retried() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let executor = executor(Duration::from_secs(1), 2, Duration::from_millis(10));
    let request = HttpRequest::get(format!("http://{}/abc", addr)).unwrap();

    match executor.execute(None, request).await {
        Err(Error::MaxRetriesExceeded {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last_error, Error::Transport(_)));
        }
        other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deadline_cancels_slow_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_secs(5), 3, Duration::from_secs(10));
    let request = HttpRequest::get(format!("{}/slow", mock_server.uri())).unwrap();
    let signal = CancelSignal::with_timeout(Duration::from_millis(10));

    let start = Instant::now();
    let err = executor.execute(Some(&signal), request).await.unwrap_err();

    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(err.is_canceled());
    assert!(err.to_string().contains("canceled"));
}

#[tokio::test]
async fn test_deadline_after_several_attempt_timeouts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let executor = executor(Duration::from_millis(100), 3, Duration::from_millis(100));

    for deadline in [220, 320] {
        let request = HttpRequest::get(format!("{}/slow", mock_server.uri())).unwrap();
        let signal = CancelSignal::with_timeout(Duration::from_millis(deadline));

        let start = Instant::now();
        let err = executor.execute(Some(&signal), request).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(!err.is_status_error());
        assert!(err.is_canceled());
        assert!(
            elapsed >= Duration::from_millis(deadline)
                && elapsed < Duration::from_millis(deadline + 70),
            "Expected about {}ms, got {:?}",
            deadline,
            elapsed
        );
    }
}

#[tokio::test]
async fn test_executor_from_config_and_pool_resize() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config: ExecutorConfig =
        serde_json::from_str(r#"{ "pool_size": 2, "timeout_ms": 5000, "retry": 1 }"#).unwrap();
    let mut executor = Executor::from_config(&config).unwrap();
    assert_eq!(executor.pool_size(), 2);

    let url = format!("{}/abc", mock_server.uri());
    executor
        .execute(None, HttpRequest::get(&url).unwrap())
        .await
        .unwrap();

    executor.set_pool_size(8).unwrap();
    assert_eq!(executor.pool_size(), 8);
    executor
        .execute(None, HttpRequest::get(&url).unwrap())
        .await
        .unwrap();
}
