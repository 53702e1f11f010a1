//! Response model: the buffered `Response` and the streaming event records.
//!
//! # Design
//! A streaming request yields an `AsyncResponse` handle immediately and then
//! delivers `AsyncMessage`s to its subscriber in the order
//! status → headers → chunk* → end, all tagged with the handle's id. If the
//! transport fails mid-flight an `AsyncError` precedes the `AsyncEnd`.

use std::fmt;
use std::string::FromUtf8Error;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::http::Headers;

/// Correlation id linking every event of one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A fully buffered response. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status_code: u16, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status_code,
            headers,
            body,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn text(self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.body)
    }
}

/// Handle returned for a streaming request. Does not own the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncResponse {
    pub id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncStatus {
    pub id: RequestId,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncHeaders {
    pub id: RequestId,
    pub headers: Headers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncChunk {
    pub id: RequestId,
    pub chunk: Vec<u8>,
}

/// Transport failure after the handle was returned. Always followed by `AsyncEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncError {
    pub id: RequestId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncEnd {
    pub id: RequestId,
}

/// A single event delivered to a streaming subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncMessage {
    Status(AsyncStatus),
    Headers(AsyncHeaders),
    Chunk(AsyncChunk),
    Error(AsyncError),
    End(AsyncEnd),
}

impl AsyncMessage {
    pub fn id(&self) -> RequestId {
        match self {
            AsyncMessage::Status(m) => m.id,
            AsyncMessage::Headers(m) => m.id,
            AsyncMessage::Chunk(m) => m.id,
            AsyncMessage::Error(m) => m.id,
            AsyncMessage::End(m) => m.id,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, AsyncMessage::End(_))
    }
}

/// Sending side of a subscriber's inbox. Passed in `Options::stream_to`.
pub type Subscriber = mpsc::UnboundedSender<AsyncMessage>;

/// Receiving side of a subscriber's inbox.
pub type Inbox = mpsc::UnboundedReceiver<AsyncMessage>;

/// Create a subscriber and the inbox its messages arrive in.
///
/// The inbox is unbounded: events queue here if the consumer falls behind.
pub fn subscriber() -> (Subscriber, Inbox) {
    mpsc::unbounded_channel()
}

/// What `Client::request` hands back: a buffered response or a streaming handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Sync(Response),
    Async(AsyncResponse),
}

impl Reply {
    pub fn into_response(self) -> Option<Response> {
        match self {
            Reply::Sync(response) => Some(response),
            Reply::Async(_) => None,
        }
    }

    pub fn into_async(self) -> Option<AsyncResponse> {
        match self {
            Reply::Async(handle) => Some(handle),
            Reply::Sync(_) => None,
        }
    }
}
