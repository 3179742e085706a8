//! `ReqwestTransport` against a local socket: failure classification,
//! timeout windows and abort handling.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use logivite_client::{ClientConfig, ReqwestTransport, RequestDescriptor, Transport, TransportError};

/// Accept one connection, capture the request head and answer with
/// `response`.
async fn serve_once(response: String) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let head = read_head(&mut socket).await;
        let _ = tx.send(head);
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    (addr, rx)
}

/// Accept connections and never answer.
async fn serve_silence() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn http(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn transport(addr: SocketAddr, request: Duration, auth: Duration) -> ReqwestTransport {
    let config = ClientConfig::new(&format!("http://{addr}/api"))
        .unwrap()
        .with_timeouts(request, auth);
    ReqwestTransport::new(config).unwrap()
}

#[tokio::test]
async fn success_body_is_returned_and_bearer_sent() {
    let (addr, head) = serve_once(http("200 OK", r#"{"success":true,"data":[1]}"#)).await;
    let transport = transport(addr, Duration::from_secs(5), Duration::from_secs(5));

    let body = transport
        .send(RequestDescriptor::get("/Dashboard/GetLocationList").bearer("tok-1"))
        .await
        .unwrap();

    assert_eq!(body, json!({ "success": true, "data": [1] }));
    let head = head.await.unwrap();
    assert!(head.starts_with("GET /api/Dashboard/GetLocationList "), "{head}");
    assert!(head.to_ascii_lowercase().contains("authorization: bearer tok-1"), "{head}");
}

#[tokio::test]
async fn raw_401_is_unauthorized() {
    let (addr, _head) = serve_once(http("401 Unauthorized", "")).await;
    let transport = transport(addr, Duration::from_secs(5), Duration::from_secs(5));

    let err = transport
        .send(RequestDescriptor::get("/Menu/GetSidebarMenuList"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Unauthorized { .. }), "{err:?}");
}

#[tokio::test]
async fn error_status_keeps_the_body() {
    let body = r#"{"errorDetail":[{"errorMessage":"Branch is inactive"}]}"#;
    let (addr, _head) = serve_once(http("400 Bad Request", body)).await;
    let transport = transport(addr, Duration::from_secs(5), Duration::from_secs(5));

    let err = transport
        .send(RequestDescriptor::post("/Dashboard/Save").json(json!({ "a": 1 })))
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, 400);
            assert_eq!(body["errorDetail"][0]["errorMessage"], "Branch is inactive");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn silent_server_times_out() {
    let addr = serve_silence().await;
    let transport = transport(addr, Duration::from_millis(200), Duration::from_millis(200));

    let err = transport
        .send(RequestDescriptor::get("/Dashboard/GetFinancialYearList"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }), "{err:?}");
}

#[tokio::test]
async fn auth_paths_use_the_shorter_window() {
    let addr = serve_silence().await;
    let transport = transport(addr, Duration::from_secs(30), Duration::from_millis(200));

    let started = Instant::now();
    let err = transport
        .send(RequestDescriptor::post("/Account/Login").json(json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = transport(addr, Duration::from_secs(5), Duration::from_secs(5));

    let err = transport
        .send(RequestDescriptor::get("/Dashboard/GetLocationList"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Network { .. }), "{err:?}");
    assert_eq!(err.kind(), logivite_client::ErrorKind::Network);
}

#[tokio::test]
async fn aborted_request_is_a_timeout() {
    let addr = serve_silence().await;
    let transport = transport(addr, Duration::from_secs(30), Duration::from_secs(30));
    let (descriptor, handle) = RequestDescriptor::get("/Dashboard/GetLocationList").abortable();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
    });
    let started = Instant::now();
    let err = transport.send(descriptor).await.unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}
