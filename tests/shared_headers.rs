use h1_ingest::{HttpConnection, Outcome, SharedHeaders};
use std::time::Duration;
use tokio::sync::oneshot;

fn feed(conn: &mut HttpConnection, uri: &str, headers: &[(&str, &str)]) {
    let request = conn.request_mut();
    request.set_method(b"GET");
    request.set_raw_uri(uri.as_bytes());
    request.set_version(b"HTTP/1.1");

    for (key, value) in headers {
        request.insert_header(key.as_bytes(), value.as_bytes());
    }
}

fn lines(headers: &SharedHeaders) -> Vec<String> {
    headers
        .iter()
        .map(|h| String::from_utf8_lossy(h.line()).into_owned())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deferred_logger_keeps_its_view() {
    let mut conn = HttpConnection::default();
    feed(&mut conn, "/first", &[("Host", "example.com"), ("X-Request-Id", "1")]);
    assert_eq!(conn.validate_request(), Outcome::Proceed);

    let (ready, wait) = oneshot::channel::<()>();
    let logged = conn.request().headers().acquire();
    let store = logged.as_ptr();

    let logger = tokio::spawn(async move {
        wait.await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        lines(&logged)
    });

    conn.reset_request();
    assert_ne!(conn.request().headers().as_ptr(), store);
    feed(&mut conn, "/second", &[("Host", "example.com"), ("X-Request-Id", "2")]);
    assert_eq!(conn.validate_request(), Outcome::Proceed);
    ready.send(()).unwrap();

    assert_eq!(
        logger.await.unwrap(),
        ["Host: example.com", "X-Request-Id: 1"]
    );
    assert_eq!(conn.request().header_str("x-request-id"), Some("2"));
    assert_eq!(conn.request().headers().ref_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_readers_then_reuse() {
    let mut conn = HttpConnection::default();
    feed(&mut conn, "/", &[("Host", "h"), ("Accept", "*/*")]);
    assert_eq!(conn.validate_request(), Outcome::Proceed);

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let headers = conn.request().headers().acquire();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                let seen = headers.lookup(b"accept").map(|h| h.value().to_vec());
                headers.release();
                seen
            })
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.await.unwrap().as_deref(), Some(&b"*/*"[..]));
    }

    // Every reader is gone, so the reset reuses the same store.
    assert_eq!(conn.request().headers().ref_count(), 1);
    let store = conn.request().headers().as_ptr();

    conn.reset_request();
    assert!(conn.request().headers().is_empty());
    assert_eq!(conn.request().headers().as_ptr(), store);
}

#[tokio::test]
async fn try_reset_across_tasks() {
    let mut headers = SharedHeaders::new(4);
    headers.make_mut().insert(b"Host", b"a");
    headers.make_mut().insert(b"Cookie", b"id=1");

    let observer = headers.acquire();
    let handle = tokio::spawn(async move { lines(&observer) });

    let headers = headers.try_reset();
    assert!(headers.is_empty());

    assert_eq!(handle.await.unwrap(), ["Host: a", "Cookie: id=1"]);
    assert_eq!(headers.ref_count(), 1);
}
