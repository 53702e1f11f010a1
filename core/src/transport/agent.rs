//! Blocking transport backed by `ureq`.
//!
//! Status codes are data here: 4xx/5xx come back as a normal result, and only
//! connection-level failures become `TransportError`s. Streaming requests are
//! executed on a background pump thread that feeds the raw event sink.

use std::fmt::Display;
use std::io::{ErrorKind, Read};
use std::thread;

use ureq::http;
use ureq::Agent;

use super::{SyncResult, Transport, TransportReply};
use crate::error::TransportError;
use crate::http::{Headers, OptionValue, StreamTarget, TransportOptions, TransportRequest};
use crate::transformer::RawEvent;

const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// `Transport` implementation over a `ureq::Agent`.
///
/// Recognised options: `connect_timeout` and `timeout_global` (ms),
/// `follow_redirects` (bool) and `max_redirects` (int). Other keys are ignored.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    chunk_size: usize,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound on the size of each streamed body chunk.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, mut request: TransportRequest) -> Result<TransportReply, TransportError> {
        let agent = agent_for(&request.options);
        let Some(target) = request.stream_to.take() else {
            let response = execute(&agent, request)?;
            let (parts, body) = response.into_parts();
            let mut buf = Vec::new();
            body.into_reader().read_to_end(&mut buf).map_err(to_transport)?;
            return Ok(TransportReply::Complete(SyncResult {
                status: parts.status.as_u16(),
                headers: collect_headers(&parts.headers),
                body: buf,
            }));
        };

        let id = target.id;
        let chunk_size = self.chunk_size;
        thread::Builder::new()
            .name(format!("relay-pump-{id}"))
            .spawn(move || pump(&agent, request, target, chunk_size))
            .map_err(to_transport)?;
        Ok(TransportReply::Streaming(id))
    }
}

fn agent_for(options: &TransportOptions) -> Agent {
    let mut config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_connect(options.connect_timeout())
        .timeout_global(options.millis("timeout_global"));
    if options.flag("follow_redirects") == Some(false) {
        config = config.max_redirects(0);
    } else if let Some(max) = options.get("max_redirects").and_then(OptionValue::as_integer) {
        config = config.max_redirects(u32::try_from(max).unwrap_or(0));
    }
    config.build().new_agent()
}

fn execute(agent: &Agent, request: TransportRequest) -> Result<http::Response<ureq::Body>, TransportError> {
    let TransportRequest {
        method,
        url,
        headers,
        body,
        ..
    } = request;

    let mut builder = http::Request::builder().method(method.as_str()).uri(url.as_str());
    for (name, value) in &headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let result = if body.is_empty() {
        agent.run(builder.body(()).map_err(to_transport)?)
    } else {
        agent.run(builder.body(body).map_err(to_transport)?)
    };
    result.map_err(to_transport)
}

fn pump(agent: &Agent, request: TransportRequest, target: StreamTarget, chunk_size: usize) {
    let StreamTarget { id, sink } = target;

    let response = match execute(agent, request) {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(id = %id, error = %err, "streaming request failed");
            let _ = sink.send(RawEvent::Error {
                id,
                reason: err.reason().to_string(),
            });
            return;
        }
    };

    let (parts, body) = response.into_parts();
    let status = RawEvent::Status {
        id,
        code: parts.status.as_u16(),
        reason: parts.status.canonical_reason().unwrap_or_default().to_string(),
    };
    let headers = RawEvent::Headers {
        id,
        headers: collect_headers(&parts.headers),
    };
    if sink.send(status).is_err() || sink.send(headers).is_err() {
        return;
    }

    let mut reader = body.into_reader();
    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let chunk = RawEvent::Chunk {
                    id,
                    chunk: buf[..n].to_vec(),
                };
                if sink.send(chunk).is_err() {
                    tracing::debug!(id = %id, "event transformer gone, abandoning body");
                    return;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "failed reading streamed body");
                let _ = sink.send(RawEvent::Error {
                    id,
                    reason: err.to_string(),
                });
                return;
            }
        }
    }
    let _ = sink.send(RawEvent::Done { id });
}

fn collect_headers(headers: &http::HeaderMap) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn to_transport(err: impl Display) -> TransportError {
    TransportError::new(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_is_at_least_one() {
        assert_eq!(UreqTransport::with_chunk_size(0).chunk_size, 1);
        assert_eq!(UreqTransport::new().chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn collect_headers_keeps_duplicates() {
        let mut map = http::HeaderMap::new();
        map.append("set-cookie", http::HeaderValue::from_static("a=1"));
        map.append("set-cookie", http::HeaderValue::from_static("b=2"));
        let headers = collect_headers(&map);
        assert_eq!(
            headers,
            vec![
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ]
        );
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let request = TransportRequest {
            method: crate::http::Method::Get,
            url: "http://127.0.0.1:1/".to_string(),
            headers: Vec::new(),
            body: Vec::new(),
            options: [("connect_timeout", 200_i64)].into_iter().collect(),
            stream_to: None,
        };
        let err = UreqTransport::new().send(request).unwrap_err();
        assert!(!err.reason().is_empty());
    }
}
