//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Client` over real
//! HTTP through `UreqTransport`, in both buffered and streaming mode.

use std::collections::HashMap;
use std::net::SocketAddr;

use mock_server::Echo;
use relay_core::{
    subscriber, AsyncMessage, Client, HttpError, Inbox, Options, RequestId, Response, UreqTransport,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client() -> Client<UreqTransport> {
    Client::new(UreqTransport::with_chunk_size(4096))
}

fn echo(resp: Response) -> Echo {
    serde_json::from_slice(resp.body()).unwrap()
}

/// Collect every message until the inbox closes.
fn drain(inbox: &mut Inbox) -> Vec<AsyncMessage> {
    let mut out = Vec::new();
    while let Some(message) = inbox.blocking_recv() {
        out.push(message);
    }
    out
}

/// Assert `messages` is status → headers → chunk* → end and return the body.
fn assert_well_formed(messages: &[AsyncMessage], id: RequestId) -> Vec<u8> {
    assert!(messages.len() >= 3, "too few messages: {messages:?}");
    assert!(messages.iter().all(|m| m.id() == id));
    assert!(matches!(messages[0], AsyncMessage::Status(_)));
    assert!(matches!(messages[1], AsyncMessage::Headers(_)));
    assert!(messages[messages.len() - 1].is_end());

    let mut body = Vec::new();
    for message in &messages[2..messages.len() - 1] {
        match message {
            AsyncMessage::Chunk(chunk) => body.extend_from_slice(&chunk.chunk),
            other => panic!("unexpected message in body: {other:?}"),
        }
    }
    body
}

#[test]
fn sync_post_reaches_server_unchanged() {
    let addr = start_server();
    // No scheme: the client must add http://.
    let url = format!("{addr}/echo");
    let headers = vec![("Content-Type".to_string(), "application/json".to_string())];

    let resp = client()
        .post(&url, r#"{"a":1}"#, headers, Options::new())
        .unwrap()
        .into_response()
        .unwrap();

    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    let seen = echo(resp);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.body, r#"{"a":1}"#);
    assert!(seen
        .headers
        .contains(&("content-type".to_string(), "application/json".to_string())));
}

#[test]
fn every_verb_round_trips() {
    let addr = start_server();
    let url = format!("http://{addr}/echo");
    let c = client();

    let seen = echo(c.get(&url, Vec::new(), Options::new()).unwrap().into_response().unwrap());
    assert_eq!(seen.method, "GET");
    let seen = echo(c.delete(&url, Vec::new(), Options::new()).unwrap().into_response().unwrap());
    assert_eq!(seen.method, "DELETE");
    let seen = echo(c.options(&url, Vec::new(), Options::new()).unwrap().into_response().unwrap());
    assert_eq!(seen.method, "OPTIONS");
    let seen = echo(c.put(&url, "p", Vec::new(), Options::new()).unwrap().into_response().unwrap());
    assert_eq!((seen.method.as_str(), seen.body.as_str()), ("PUT", "p"));
    let seen = echo(c.patch(&url, "q", Vec::new(), Options::new()).unwrap().into_response().unwrap());
    assert_eq!((seen.method.as_str(), seen.body.as_str()), ("PATCH", "q"));

    let head = c.head(&url, Vec::new(), Options::new()).unwrap().into_response().unwrap();
    assert_eq!(head.status_code(), 200);
    assert!(head.body().is_empty());
}

#[test]
fn error_status_is_a_response_not_an_error() {
    let addr = start_server();
    let resp = client()
        .get(&format!("{addr}/status/503"), Vec::new(), Options::new())
        .unwrap()
        .into_response()
        .unwrap();

    assert_eq!(resp.status_code(), 503);
    assert!(!resp.is_success());
    assert_eq!(resp.text().unwrap(), "status 503");
}

#[test]
fn query_auth_and_base_url_reach_server() {
    let addr = start_server();
    let config = relay_core::ClientConfig::default()
        .base_url(format!("{addr}"))
        .default_header("X-Client", "relay");
    let c = Client::with_config(UreqTransport::new(), config);

    let options = Options::new().query("q", "a b").basic_auth("aladdin", "opensesame");
    let seen = echo(c.get("/echo", Vec::new(), options).unwrap().into_response().unwrap());

    assert_eq!(seen.path, "/echo");
    assert_eq!(seen.query.as_deref(), Some("q=a+b"));
    assert!(seen.headers.contains(&("x-client".to_string(), "relay".to_string())));
    assert!(seen.headers.contains(&(
        "authorization".to_string(),
        "Basic YWxhZGRpbjpvcGVuc2VzYW1l".to_string()
    )));
}

#[test]
fn redirects_are_followed_by_default() {
    let addr = start_server();
    let seen = echo(
        client()
            .get(&format!("{addr}/redirect"), Vec::new(), Options::new())
            .unwrap()
            .into_response()
            .unwrap(),
    );
    assert_eq!(seen.path, "/echo");
}

#[test]
fn connection_refused_is_a_single_error() {
    // Nothing listens on port 1.
    let err = client()
        .get("127.0.0.1:1/", Vec::new(), Options::new().timeout(500))
        .unwrap_err();
    assert!(matches!(err, HttpError::Transport(_)));
    assert!(!err.message().is_empty());
}

#[test]
fn streaming_relays_status_headers_chunks_end() {
    let addr = start_server();
    let (sub, mut inbox) = subscriber();

    let handle = client()
        .get(&format!("{addr}/bytes/20000"), Vec::new(), Options::new().stream_to(sub))
        .unwrap()
        .into_async()
        .unwrap();

    let messages = drain(&mut inbox);
    let body = assert_well_formed(&messages, handle.id);
    assert_eq!(body.len(), 20000);
    assert!(body.iter().all(|b| *b == b'x'));
    assert!(messages.len() - 3 >= 5, "expected at least five 4 KiB chunks");

    match &messages[0] {
        AsyncMessage::Status(status) => assert_eq!(status.code, 200),
        other => panic!("expected status, got {other:?}"),
    }
    match &messages[1] {
        AsyncMessage::Headers(headers) => assert!(headers
            .headers
            .iter()
            .any(|(k, v)| k == "content-type" && v == "application/octet-stream")),
        other => panic!("expected headers, got {other:?}"),
    }
}

#[test]
fn concurrent_streams_keep_their_ids_apart() {
    let addr = start_server();
    let (sub, mut inbox) = subscriber();
    let c = client();

    let a = c
        .get(&format!("{addr}/bytes/9000"), Vec::new(), Options::new().stream_to(sub.clone()))
        .unwrap()
        .into_async()
        .unwrap();
    let b = c
        .post(&format!("{addr}/echo"), "hello", Vec::new(), Options::new().stream_to(sub))
        .unwrap()
        .into_async()
        .unwrap();
    assert_ne!(a.id, b.id);

    let mut by_id: HashMap<RequestId, Vec<AsyncMessage>> = HashMap::new();
    for message in drain(&mut inbox) {
        by_id.entry(message.id()).or_default().push(message);
    }
    assert_eq!(by_id.len(), 2);

    let body_a = assert_well_formed(&by_id[&a.id], a.id);
    assert_eq!(body_a.len(), 9000);
    let body_b = assert_well_formed(&by_id[&b.id], b.id);
    let seen: Echo = serde_json::from_slice(&body_b).unwrap();
    assert_eq!(seen.body, "hello");
}

#[test]
fn streaming_failure_ends_with_error_then_end() {
    let (sub, mut inbox) = subscriber();
    let handle = client()
        .get("127.0.0.1:1/", Vec::new(), Options::new().timeout(500).stream_to(sub))
        .unwrap()
        .into_async()
        .unwrap();

    let messages = drain(&mut inbox);
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert!(matches!(&messages[0], AsyncMessage::Error(e) if e.id == handle.id && !e.reason.is_empty()));
    assert!(messages[1].is_end());
}

#[test]
fn dropping_the_inbox_does_not_block_the_client() {
    let addr = start_server();
    let (sub, inbox) = subscriber();
    drop(inbox);

    let reply = client()
        .get(&format!("{addr}/bytes/50000"), Vec::new(), Options::new().stream_to(sub))
        .unwrap();
    assert!(reply.into_async().is_some());
}
