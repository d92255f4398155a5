//! Integration tests for the HTTP transport: retry, backoff, atomic writes

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use plugin_harvester::fetcher::http::part_path;
use plugin_harvester::fetcher::{FetcherError, RegistryClient};

#[tokio::test]
async fn fetch_json_returns_parsed_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/info.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"version": "5.3"}"#)
        .create_async()
        .await;

    let client = RegistryClient::new();
    let body = client
        .fetch_json(&format!("{}/info.json", server.url()))
        .await
        .unwrap();

    assert_eq!(body["version"], "5.3");
    mock.assert_async().await;
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/missing.json")
        .with_status(404)
        .with_body("not found")
        // A 4xx must produce exactly one request.
        .expect(1)
        .create_async()
        .await;

    let client = RegistryClient::new().with_max_attempts(3);
    let result = client
        .fetch_json(&format!("{}/missing.json", server.url()))
        .await;

    assert!(matches!(result, Err(FetcherError::Http(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_retried_until_the_budget_is_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/flaky.json")
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let client = RegistryClient::new().with_max_attempts(2);
    let result = client
        .fetch_json(&format!("{}/flaky.json", server.url()))
        .await;

    assert!(matches!(result, Err(FetcherError::Network(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn download_streams_to_final_path_with_no_part_file_left() {
    let mut server = mockito::Server::new_async().await;
    let payload = vec![0x50u8; 64 * 1024];
    let _mock = server
        .mock("GET", "/archive.zip")
        .with_status(200)
        .with_body(payload.clone())
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("archive.zip");

    let client = RegistryClient::new();
    client
        .download_to_path(&format!("{}/archive.zip", server.url()), &dest)
        .await
        .unwrap();

    let mut written = Vec::new();
    std::fs::File::open(&dest)
        .unwrap()
        .read_to_end(&mut written)
        .unwrap();
    assert_eq!(written, payload);
    assert!(!part_path(&dest).exists());
}

#[tokio::test]
async fn exhausted_download_leaves_no_partial_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/broken.zip")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("broken.zip");

    let client = RegistryClient::new().with_max_attempts(2);
    let result = client
        .download_to_path(&format!("{}/broken.zip", server.url()), &dest)
        .await;

    assert!(matches!(result, Err(FetcherError::Network(_))));
    assert!(!dest.exists());
    assert!(!part_path(&dest).exists());
    mock.assert_async().await;
}

/// Minimal one-shot HTTP server that fails the first `failures` requests with
/// a 500 and then serves `body` with a 200. Lets the retry loop be observed
/// across attempts, which a static mock cannot express.
async fn flaky_http_server(failures: usize, body: Vec<u8>) -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let attempt = hits_clone.fetch_add(1, Ordering::SeqCst);
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;

                if attempt < failures {
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                } else {
                    let head = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.write_all(&body).await;
                }
                let _ = stream.flush().await;
            });
        }
    });

    (format!("http://{addr}/plugin.zip"), hits)
}

#[tokio::test]
async fn transient_failure_then_success_yields_a_complete_file() {
    let payload = b"PK complete archive bytes".to_vec();
    let (url, hits) = flaky_http_server(1, payload.clone()).await;

    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("plugin.zip");

    let client = RegistryClient::new();
    client.download_to_path(&url, &dest).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    // No partial left behind from the failed first attempt.
    assert!(!part_path(&dest).exists());
}
