//! Both HTTP backends against a throwaway local server.
//!
//! Each test serves one canned response per connection and checks that the
//! fetch-style and callback-style transports report it identically.

use nimbus_sdk_client::{CallbackTransport, FetchTransport, Transport, TransportError};
use nimbus_sdk_types::{Method, Request, RequestBody, ResponseBody};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve `response` to the next connection and hand back the raw request.
async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let raw = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        raw
    });
    (url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> String {
    let mut out = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    out.push_str(&String::from_utf8_lossy(body));
    out
}

fn backends() -> Vec<(&'static str, Box<dyn Transport>)> {
    vec![
        ("fetch", Box::new(FetchTransport::new().unwrap())),
        ("callback", Box::new(CallbackTransport::new())),
    ]
}

// ===========================================
// Contract Tests
// ===========================================

#[tokio::test]
async fn no_content_yields_empty_object() {
    for (name, transport) in backends() {
        let (url, server) = serve_once(http_response("204 No Content", &[], b"")).await;
        let response = transport
            .execute(Request::new(Method::Delete, format!("{url}/o/abc")))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(response.status, 204, "{name}");
        assert_eq!(response.body, ResponseBody::Json(json!({})), "{name}");
    }
}

#[tokio::test]
async fn error_status_resolves_normally() {
    for (name, transport) in backends() {
        let body = br#"{"errorCode":"OBJECT_NOT_FOUND","message":"gone"}"#;
        let (url, server) = serve_once(http_response(
            "404 Not Found",
            &[("Content-Type", "application/json")],
            body,
        ))
        .await;
        let response = transport
            .execute(Request::new(Method::Get, format!("{url}/o/abc")))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(response.status, 404, "{name}");
        assert_eq!(
            response.body,
            ResponseBody::Json(json!({"errorCode": "OBJECT_NOT_FOUND", "message": "gone"})),
            "{name}"
        );
    }
}

#[tokio::test]
async fn non_json_body_falls_back_to_text() {
    for (name, transport) in backends() {
        let (url, server) =
            serve_once(http_response("502 Bad Gateway", &[], b"upstream down")).await;
        let response = transport
            .execute(Request::new(Method::Get, url))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(response.body, ResponseBody::Text("upstream down".into()), "{name}");
    }
}

#[tokio::test]
async fn wire_headers_and_body_are_sent() {
    for (name, transport) in backends() {
        let (url, server) = serve_once(http_response(
            "201 Created",
            &[("ETag", "\"1\"")],
            br#"{"objectID":"abc"}"#,
        ))
        .await;
        let mut request = Request::new(Method::Post, format!("{url}/objects"));
        request.headers.append("X-App-ID", "app1");
        request.content_type = Some("application/json".into());
        request.access_token = Some("tok".into());
        request.body = Some(RequestBody::Json(json!({"score": 10})));

        let response = transport.execute(request).await.unwrap();
        let raw = server.await.unwrap().to_lowercase();

        assert_eq!(response.status, 201, "{name}");
        assert_eq!(response.etag(), Some("\"1\""), "{name}");
        assert!(raw.starts_with("post /objects"), "{name}: {raw}");
        assert!(raw.contains("x-app-id: app1"), "{name}");
        assert!(raw.contains("content-type: application/json"), "{name}");
        assert!(raw.contains("authorization: bearer tok"), "{name}");
        assert!(raw.ends_with(r#"{"score":10}"#), "{name}");
    }
}

#[tokio::test]
async fn download_is_binary_only_on_success() {
    for (name, transport) in backends() {
        let (url, server) = serve_once(http_response(
            "200 OK",
            &[("Content-Type", "application/json")],
            br#"{"stored":"as-is"}"#,
        ))
        .await;
        let ok = transport
            .execute_for_download(Request::new(Method::Get, format!("{url}/body")))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(
            ok.body,
            ResponseBody::Binary(br#"{"stored":"as-is"}"#.to_vec()),
            "{name}"
        );

        let (url, server) = serve_once(http_response(
            "404 Not Found",
            &[],
            br#"{"errorCode":"OBJECT_BODY_NOT_FOUND"}"#,
        ))
        .await;
        let missing = transport
            .execute_for_download(Request::new(Method::Get, format!("{url}/body")))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(
            missing.body,
            ResponseBody::Json(json!({"errorCode": "OBJECT_BODY_NOT_FOUND"})),
            "{name}"
        );
    }
}

// ===========================================
// Transport Failure Tests
// ===========================================

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    for (name, transport) in backends() {
        let result = transport.execute(Request::new(Method::Get, url.clone())).await;
        assert!(
            matches!(result, Err(TransportError::ConnectionFailed(_))),
            "{name}: {result:?}"
        );
    }
}
