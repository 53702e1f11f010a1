//! Request pipeline: turns a high-level call into a transport-ready request.
//!
//! # Design
//! `build_request` resolves options, runs the request hooks, shapes the URL
//! and, for streaming calls, starts the event transformer before the request
//! is handed to the transport. It performs no I/O and raises no errors of its
//! own apart from failing to start the transformer thread or encode a query.

use std::thread::JoinHandle;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::HttpError;
use crate::hooks::Hooks;
use crate::http::{Headers, Method, StreamTarget, TransportRequest};
use crate::options::{resolve_transport_options, ClientConfig, Options};
use crate::response::RequestId;
use crate::transformer::{EventTransformer, RawEvent, RawEventSender};
use crate::url;

/// The running side of a streaming request.
#[derive(Debug)]
pub struct StreamHandle {
    pub id: RequestId,
    pub worker: JoinHandle<()>,
    raw: RawEventSender,
}

impl StreamHandle {
    /// Tell the subscriber the request failed before the transport took it.
    pub(crate) fn fail(&self, reason: impl Into<String>) {
        let _ = self.raw.send(RawEvent::Error {
            id: self.id,
            reason: reason.into(),
        });
    }
}

#[derive(Debug)]
pub struct PreparedRequest {
    pub request: TransportRequest,
    /// Present exactly when the call streams.
    pub stream: Option<StreamHandle>,
}

impl PreparedRequest {
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }
}

pub fn build_request(
    method: Method,
    url: &str,
    body: Vec<u8>,
    headers: Headers,
    options: Options,
    hooks: &Hooks,
    config: &ClientConfig,
) -> Result<PreparedRequest, HttpError> {
    let options = hooks.options(options);
    let transport_options = resolve_transport_options(config, &options);
    let body = hooks.request_body(body);
    let headers = hooks.request_headers(assemble_headers(config, &options, headers));
    let url = resolve_url(hooks.url(url.to_string()), config, &options)?;

    let (stream_to, stream) = match options.stream_to {
        Some(subscriber) => {
            let id = RequestId::new();
            let (raw, worker) = EventTransformer::new(id, subscriber, hooks.clone()).spawn()?;
            let target = StreamTarget {
                id,
                sink: raw.clone(),
            };
            (Some(target), Some(StreamHandle { id, worker, raw }))
        }
        None => (None, None),
    };

    tracing::debug!(
        method = %method,
        url = %url,
        streaming = stream.is_some(),
        id = ?stream.as_ref().map(|s| s.id),
        "request prepared"
    );

    Ok(PreparedRequest {
        request: TransportRequest {
            method,
            url,
            headers,
            body,
            options: transport_options,
            stream_to,
        },
        stream,
    })
}

/// Client defaults first, then the caller's headers, then auth.
fn assemble_headers(config: &ClientConfig, options: &Options, headers: Headers) -> Headers {
    let mut all = config.default_headers.clone();
    all.extend(headers);
    if let Some((user, password)) = &options.basic_auth {
        let token = STANDARD.encode(format!("{user}:{password}"));
        all.push(("Authorization".to_string(), format!("Basic {token}")));
    }
    all
}

fn resolve_url(raw: String, config: &ClientConfig, options: &Options) -> Result<String, HttpError> {
    let joined = match &config.base_url {
        Some(base) => url::join_base(base, &raw),
        None => raw,
    };
    let with_query = url::append_query(&joined, &options.query)?;
    Ok(url::normalize(&with_query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::OptionValue;
    use crate::response::{subscriber, AsyncEnd, AsyncMessage};

    fn build(method: Method, url: &str, body: &[u8], headers: Headers, options: Options) -> PreparedRequest {
        build_request(method, url, body.to_vec(), headers, options, &Hooks::new(), &ClientConfig::default())
            .unwrap()
    }

    #[test]
    fn post_scenario_passes_body_and_headers_unchanged() {
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let prepared = build(Method::Post, "example.com/api", br#"{"a":1}"#, headers.clone(), Options::new());

        assert!(!prepared.is_streaming());
        let req = prepared.request;
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://example.com/api");
        assert_eq!(req.body, br#"{"a":1}"#);
        assert_eq!(req.headers, headers);
        assert_eq!(req.options.get("connect_timeout"), Some(&OptionValue::Integer(5000)));
        assert!(req.stream_to.is_none());
    }

    #[test]
    fn header_order_and_duplicates_are_preserved() {
        let headers = vec![
            ("Accept".to_string(), "text/html".to_string()),
            ("X-Trace".to_string(), "1".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        let prepared = build(Method::Get, "https://x.test", b"", headers.clone(), Options::new());
        assert_eq!(prepared.request.headers, headers);
        assert_eq!(prepared.request.url, "https://x.test");
    }

    #[test]
    fn request_hooks_are_applied() {
        let hooks = Hooks::new()
            .on_url(|u| format!("{u}/v2"))
            .on_request_body(|mut b| {
                b.extend_from_slice(b"!");
                b
            })
            .on_request_headers(|mut h| {
                h.retain(|(k, _)| k != "X-Drop");
                h
            })
            .on_options(|o| o.timeout(77));
        let headers = vec![("X-Drop".to_string(), "1".to_string())];
        let prepared = build_request(
            Method::Put,
            "api.test",
            b"hi".to_vec(),
            headers,
            Options::new(),
            &hooks,
            &ClientConfig::default(),
        )
        .unwrap();

        assert_eq!(prepared.request.url, "http://api.test/v2");
        assert_eq!(prepared.request.body, b"hi!");
        assert!(prepared.request.headers.is_empty());
        assert_eq!(prepared.request.options.get("connect_timeout"), Some(&OptionValue::Integer(77)));
    }

    #[test]
    fn config_base_url_headers_and_query() {
        let config = ClientConfig::default()
            .base_url("api.test/v1/")
            .default_header("User-Agent", "relay");
        let options = Options::new().query("q", "rust lang").basic_auth("aladdin", "opensesame");
        let prepared = build_request(
            Method::Get,
            "/search",
            Vec::new(),
            vec![("Accept".to_string(), "*/*".to_string())],
            options,
            &Hooks::new(),
            &config,
        )
        .unwrap();

        assert_eq!(prepared.request.url, "http://api.test/v1/search?q=rust+lang");
        assert_eq!(
            prepared.request.headers,
            vec![
                ("User-Agent".to_string(), "relay".to_string()),
                ("Accept".to_string(), "*/*".to_string()),
                ("Authorization".to_string(), "Basic YWxhZGRpbjpvcGVuc2VzYW1l".to_string()),
            ]
        );
    }

    #[test]
    fn streaming_starts_transformer_and_marks_async() {
        let (sub, mut inbox) = subscriber();
        let prepared = build(Method::Get, "x.test", b"", Vec::new(), Options::new().stream_to(sub));

        let stream = prepared.stream.expect("streaming handle");
        let target = prepared.request.stream_to.expect("stream target");
        assert_eq!(target.id, stream.id);
        assert!(prepared.request.options.is_async());

        target.sink.send(RawEvent::Done { id: target.id }).unwrap();
        stream.worker.join().unwrap();
        assert_eq!(
            inbox.blocking_recv(),
            Some(AsyncMessage::End(AsyncEnd { id: stream.id }))
        );
    }

    #[test]
    fn dropped_inbox_stops_transformer_and_closes_sink() {
        let (sub, inbox) = subscriber();
        let prepared = build(Method::Get, "x.test", b"", Vec::new(), Options::new().stream_to(sub));
        let stream = prepared.stream.unwrap();
        let target = prepared.request.stream_to.unwrap();
        drop(inbox);

        target
            .sink
            .send(RawEvent::Chunk { id: target.id, chunk: b"body".to_vec() })
            .unwrap();
        // Returns only because the transformer exits without seeing Done.
        stream.worker.join().unwrap();

        assert!(target.sink.send(RawEvent::Done { id: target.id }).is_err());
    }

    #[test]
    fn failed_stream_reports_error_then_end() {
        let (sub, mut inbox) = subscriber();
        let prepared = build(Method::Get, "x.test", b"", Vec::new(), Options::new().stream_to(sub));
        let stream = prepared.stream.unwrap();

        stream.fail("refused");
        let id = stream.id;
        stream.worker.join().unwrap();

        let first = inbox.blocking_recv().unwrap();
        assert!(matches!(first, AsyncMessage::Error(ref e) if e.reason == "refused" && e.id == id));
        assert!(inbox.blocking_recv().unwrap().is_end());
    }
}
