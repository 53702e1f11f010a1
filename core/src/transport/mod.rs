//! The transport boundary.
//!
//! # Design
//! A `Transport` performs the network call for a resolved `TransportRequest`.
//! In buffered mode it blocks and returns the whole response. In streaming
//! mode (`request.stream_to` is set) it returns the request id at once and
//! delivers `RawEvent`s to the target sink: status, headers, chunks, then
//! done, or an error event if the exchange fails after the handle is out.

mod agent;

pub use agent::UreqTransport;

use crate::error::TransportError;
use crate::http::{Headers, TransportRequest};
use crate::response::RequestId;

/// A fully buffered exchange as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportReply {
    Complete(SyncResult),
    Streaming(RequestId),
}

pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError> {
        (**self).send(request)
    }
}
