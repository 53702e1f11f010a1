//! HTTP client core with buffered and streaming responses.
//!
//! # Overview
//! `Client` turns a call (method, URL, body, headers, options) into a
//! transport-ready `TransportRequest` and hands it to a `Transport`. Buffered
//! calls return a `Response`. Streaming calls return an `AsyncResponse` handle
//! at once while an event transformer relays status, headers, body chunks and
//! end-of-stream to the subscriber named in `Options::stream_to`.
//!
//! # Design
//! - The transport is a trait; `UreqTransport` is the bundled implementation.
//! - One transformer thread per streaming request, reading raw events from a
//!   channel until a terminal event. Every stream ends with exactly one
//!   `AsyncEnd`, even when the transport fails or closes early.
//! - Customisation goes through `Hooks`, a struct of optional transforms that
//!   default to identity.
//! - No retries and no mid-flight cancellation. Dropping the subscriber's inbox
//!   stops the transformer at its next send.

pub mod client;
pub mod error;
pub mod hooks;
pub mod http;
pub mod options;
pub mod pipeline;
pub mod response;
pub mod transformer;
pub mod transport;
pub mod url;

pub use client::Client;
pub use error::{HttpError, TransportError};
pub use hooks::Hooks;
pub use http::{Headers, Method, OptionValue, StreamTarget, TransportOptions, TransportRequest};
pub use options::{ClientConfig, Options, DEFAULT_TIMEOUT_MS};
pub use response::{
    subscriber, AsyncChunk, AsyncEnd, AsyncError, AsyncHeaders, AsyncMessage, AsyncResponse, AsyncStatus,
    Inbox, Reply, RequestId, Response, Subscriber,
};
pub use transformer::RawEvent;
pub use transport::{SyncResult, Transport, TransportReply, UreqTransport};
