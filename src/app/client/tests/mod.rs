//! Fetch tests against a local HTTP stub
//!
//! The stub answers every request with one canned response and records
//! the request paths, so tests can count network round trips.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;
use crate::app::cache::{CacheConfig, VerificationStatus};
use crate::app::hash::Md5Hash;

/// How the stub answers each request
#[derive(Clone, Copy)]
struct Reply {
    status: u16,
    body: &'static [u8],
    /// Wait before the response headers
    delay: Duration,
    /// Content-Length sent, which may exceed `body.len()`
    advertised_len: usize,
    /// Body bytes per write, with `interval` between writes
    chunk_size: usize,
    interval: Duration,
    /// Silence after the body, before the connection is closed
    stall: Duration,
}

impl Reply {
    fn new(status: u16, body: &'static [u8]) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
            advertised_len: body.len(),
            chunk_size: body.len().max(1),
            interval: Duration::ZERO,
            stall: Duration::ZERO,
        }
    }
}

struct StubServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    async fn start(status: u16, body: &'static [u8], delay: Duration) -> Self {
        Self::serve(Reply {
            delay,
            ..Reply::new(status, body)
        })
        .await
    }

    async fn serve(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let paths = Arc::new(Mutex::new(Vec::new()));

        let counter = Arc::clone(&hits);
        let seen = Arc::clone(&paths);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = Arc::clone(&counter);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                    let request = String::from_utf8_lossy(&request);
                    if let Some(path) = request.split_whitespace().nth(1) {
                        seen.lock().unwrap().push(path.to_string());
                    }

                    tokio::time::sleep(reply.delay).await;
                    let header = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        reply.status, reply.advertised_len
                    );
                    if socket.write_all(header.as_bytes()).await.is_err() {
                        return;
                    }
                    for chunk in reply.body.chunks(reply.chunk_size) {
                        if socket.write_all(chunk).await.is_err() {
                            return;
                        }
                        let _ = socket.flush().await;
                        tokio::time::sleep(reply.interval).await;
                    }
                    tokio::time::sleep(reply.stall).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}/grid/v5.1/", addr),
            hits,
            paths,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

const BODY: &[u8] = b"CDF\x01 pretend grid";

async fn client_for(server: &StubServer, temp_dir: &TempDir, config: ClientConfig) -> FireCciClient {
    let cache = CacheStore::new(CacheConfig::with_cache_root(temp_dir.path().to_path_buf()))
        .await
        .unwrap();
    let resolver = Resolver::new(&server.base_url).unwrap();
    FireCciClient::with_config(Arc::new(cache), resolver, config).unwrap()
}

#[tokio::test]
async fn test_fetch_downloads_once_and_then_hits_cache() {
    let server = StubServer::start(200, BODY, Duration::ZERO).await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    let first = client.fetch(2022, 6, false).await.unwrap();
    let second = client.fetch(2022, 6, false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(server.hits(), 1);
    assert_eq!(tokio::fs::read(&first).await.unwrap(), BODY);
    assert_eq!(
        server.paths.lock().unwrap()[0],
        "/grid/v5.1/2022/20220601-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc"
    );

    let key = YearMonth::new(2022, 6).unwrap();
    assert_eq!(
        client.cache().verify(&key).await.unwrap(),
        VerificationStatus::Verified
    );
}

#[tokio::test]
async fn test_forced_fetch_downloads_again() {
    let server = StubServer::start(200, BODY, Duration::ZERO).await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    let key = YearMonth::new(2021, 1).unwrap();
    tokio::fs::write(client.cache().path_for(&key), b"stale")
        .await
        .unwrap();

    let path = client.fetch(2021, 1, true).await.unwrap();
    assert_eq!(server.hits(), 1);
    assert_eq!(tokio::fs::read(&path).await.unwrap(), BODY);

    client.fetch(2021, 1, true).await.unwrap();
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_not_found_leaves_no_entry() {
    let server = StubServer::start(404, b"missing", Duration::ZERO).await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    let result = client.fetch(2020, 2, false).await;
    match result {
        Err(FetchError::Status { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/2020/20200201-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc"));
        }
        other => panic!("Expected FetchError::Status, got {:?}", other),
    }

    let key = YearMonth::new(2020, 2).unwrap();
    assert!(!client.cache().exists(&key));
    assert!(!client.cache().temp_path_for(&key).exists());
    assert!(client.cache().entries().await.is_empty());
}

#[tokio::test]
async fn test_invalid_month_never_touches_network() {
    let server = StubServer::start(200, BODY, Duration::ZERO).await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    let result = client.fetch(2022, 13, false).await;
    assert!(matches!(result, Err(FetchError::InvalidDate(_))));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_timeout_is_reported_and_cleaned_up() {
    let server = StubServer::start(200, BODY, Duration::from_secs(5)).await;
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig {
        read_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let client = client_for(&server, &temp_dir, config).await;

    let result = client.fetch(2019, 7, false).await;
    assert!(matches!(result, Err(FetchError::Timeout { seconds: 1, .. })));

    let key = YearMonth::new(2019, 7).unwrap();
    assert!(!client.cache().exists(&key));
    assert!(!client.cache().temp_path_for(&key).exists());
}

#[tokio::test]
async fn test_concurrent_fetches_of_one_key_hit_network_once() {
    let server = StubServer::start(200, BODY, Duration::from_millis(100)).await;
    let temp_dir = TempDir::new().unwrap();
    let client = Arc::new(client_for(&server, &temp_dir, ClientConfig::default()).await);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.fetch(2018, 8, false).await })
        })
        .collect();

    let mut paths = Vec::new();
    for handle in handles {
        paths.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(server.hits(), 1);
    assert!(paths.windows(2).all(|w| w[0] == w[1]));
    assert!(client.cache().reservations().is_empty());
}

#[tokio::test]
async fn test_fetch_many_preserves_order() {
    let server = StubServer::start(200, BODY, Duration::from_millis(10)).await;
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig {
        concurrency: 2,
        ..Default::default()
    };
    let client = client_for(&server, &temp_dir, config).await;

    let keys: Vec<YearMonth> = [3, 1, 2]
        .into_iter()
        .map(|m| YearMonth::new(2017, m).unwrap())
        .collect();
    let results = client.fetch_many(&keys, false).await;

    assert_eq!(results.len(), 3);
    for ((key, result), expected) in results.iter().zip(&keys) {
        assert_eq!(key, expected);
        assert_eq!(result.as_ref().unwrap(), &client.cache().path_for(expected));
    }
    assert_eq!(server.hits(), 3);
    assert_eq!(
        client.cache().entries().await,
        vec![
            YearMonth::new(2017, 1).unwrap(),
            YearMonth::new(2017, 2).unwrap(),
            YearMonth::new(2017, 3).unwrap()
        ]
    );
}

#[tokio::test]
async fn test_fetch_year_outside_coverage_is_empty() {
    let server = StubServer::start(200, BODY, Duration::ZERO).await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    assert!(client.fetch_year(1999, false).await.is_empty());
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_fetch_year_requests_twelve_months() {
    let server = StubServer::start(200, BODY, Duration::ZERO).await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    let results = client.fetch_year(2010, false).await;
    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(server.hits(), 12);

    let key = YearMonth::new(2010, 12).unwrap();
    let sidecar = tokio::fs::read_to_string(client.cache().sidecar_path_for(&key))
        .await
        .unwrap();
    assert_eq!(sidecar.trim(), Md5Hash::compute(BODY).to_hex());
}

const LARGE_BODY: &[u8] = &[b'g'; 3000];
const PARTIAL_BODY: &[u8] = &[b'p'; 500];

#[tokio::test]
async fn test_steady_stream_longer_than_read_timeout_completes() {
    // 30 writes 100 ms apart: three seconds in total, never silent for one
    let server = StubServer::serve(Reply {
        chunk_size: 100,
        interval: Duration::from_millis(100),
        ..Reply::new(200, LARGE_BODY)
    })
    .await;
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig {
        read_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let client = client_for(&server, &temp_dir, config).await;

    let path = client.fetch(2022, 2, false).await.unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), LARGE_BODY);
    assert_eq!(server.hits(), 1);

    let key = YearMonth::new(2022, 2).unwrap();
    assert_eq!(
        client.cache().verify(&key).await.unwrap(),
        VerificationStatus::Verified
    );
}

#[tokio::test]
async fn test_stall_mid_body_times_out() {
    let server = StubServer::serve(Reply {
        advertised_len: 2000,
        stall: Duration::from_secs(5),
        ..Reply::new(200, PARTIAL_BODY)
    })
    .await;
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig {
        read_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let client = client_for(&server, &temp_dir, config).await;

    let result = client.fetch(2016, 4, false).await;
    assert!(matches!(result, Err(FetchError::Timeout { seconds: 1, .. })));

    let key = YearMonth::new(2016, 4).unwrap();
    assert!(!client.cache().exists(&key));
    assert!(!client.cache().temp_path_for(&key).exists());
}

#[tokio::test]
async fn test_truncated_body_is_never_published() {
    let server = StubServer::serve(Reply {
        advertised_len: 10_000,
        ..Reply::new(200, PARTIAL_BODY)
    })
    .await;
    let temp_dir = TempDir::new().unwrap();
    let client = client_for(&server, &temp_dir, ClientConfig::default()).await;

    let result = client.fetch(2014, 10, false).await;
    assert!(result.is_err());

    let key = YearMonth::new(2014, 10).unwrap();
    assert!(!client.cache().exists(&key));
    assert!(!client.cache().temp_path_for(&key).exists());
    assert!(!client.cache().sidecar_path_for(&key).exists());
    assert!(client.cache().entries().await.is_empty());
}

#[tokio::test]
async fn test_failed_forced_refetch_keeps_published_entry() {
    let temp_dir = TempDir::new().unwrap();
    let key = YearMonth::new(2013, 5).unwrap();

    let good = StubServer::start(200, BODY, Duration::ZERO).await;
    let client = client_for(&good, &temp_dir, ClientConfig::default()).await;
    let path = client.fetch(2013, 5, false).await.unwrap();

    let broken = StubServer::serve(Reply {
        advertised_len: 10_000,
        ..Reply::new(200, PARTIAL_BODY)
    })
    .await;
    let client = client_for(&broken, &temp_dir, ClientConfig::default()).await;
    assert!(client.fetch(2013, 5, true).await.is_err());
    assert_eq!(broken.hits(), 1);

    assert_eq!(tokio::fs::read(&path).await.unwrap(), BODY);
    let sidecar = tokio::fs::read_to_string(client.cache().sidecar_path_for(&key))
        .await
        .unwrap();
    assert_eq!(sidecar.trim(), Md5Hash::compute(BODY).to_hex());
    assert_eq!(
        client.cache().verify(&key).await.unwrap(),
        VerificationStatus::Verified
    );
    assert!(!client.cache().temp_path_for(&key).exists());
}
