//! Event transformer: turns raw transport events into subscriber messages.
//!
//! # Design
//! One transformer runs per streaming request on its own thread. It blocks on
//! the raw event channel, translates each event through the response hooks
//! and forwards it to the subscriber in arrival order. It never batches,
//! reorders or drops events, and applies no backpressure: the subscriber's
//! inbox is unbounded.
//!
//! Termination:
//! - `Done` → `AsyncEnd`, stop.
//! - `Error` → `AsyncError` then `AsyncEnd`, stop.
//! - raw channel closed without either → synthesized `AsyncEnd`, stop.
//! - subscriber gone → stop silently. Dropping the raw receiver makes the
//!   transport's next send fail, which is its cue to stop pumping.

use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use crate::error::HttpError;
use crate::hooks::Hooks;
use crate::http::Headers;
use crate::response::{
    AsyncChunk, AsyncEnd, AsyncError, AsyncHeaders, AsyncMessage, AsyncStatus, RequestId, Subscriber,
};

/// Events a streaming transport emits, each tagged with the request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    Status { id: RequestId, code: u16, reason: String },
    Headers { id: RequestId, headers: Headers },
    Chunk { id: RequestId, chunk: Vec<u8> },
    Error { id: RequestId, reason: String },
    Done { id: RequestId },
}

impl RawEvent {
    pub fn id(&self) -> RequestId {
        match self {
            RawEvent::Status { id, .. }
            | RawEvent::Headers { id, .. }
            | RawEvent::Chunk { id, .. }
            | RawEvent::Error { id, .. }
            | RawEvent::Done { id } => *id,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, RawEvent::Done { .. } | RawEvent::Error { .. })
    }

    fn kind(&self) -> &'static str {
        match self {
            RawEvent::Status { .. } => "status",
            RawEvent::Headers { .. } => "headers",
            RawEvent::Chunk { .. } => "chunk",
            RawEvent::Error { .. } => "error",
            RawEvent::Done { .. } => "done",
        }
    }
}

pub type RawEventSender = mpsc::UnboundedSender<RawEvent>;
pub type RawEventReceiver = mpsc::UnboundedReceiver<RawEvent>;

pub struct EventTransformer {
    id: RequestId,
    subscriber: Subscriber,
    hooks: Hooks,
}

impl EventTransformer {
    /// `id` tags the synthesized `AsyncEnd` if the raw stream closes early.
    pub fn new(id: RequestId, subscriber: Subscriber, hooks: Hooks) -> Self {
        Self {
            id,
            subscriber,
            hooks,
        }
    }

    /// Start the transformer on a dedicated thread.
    ///
    /// Returns the sender the transport should deliver raw events to. The
    /// worker idles until the first event arrives.
    pub fn spawn(self) -> Result<(RawEventSender, JoinHandle<()>), HttpError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name(format!("relay-events-{}", self.id))
            .spawn(move || self.run(rx))
            .map_err(HttpError::Worker)?;
        Ok((tx, worker))
    }

    /// Drain `events` until a terminal event, channel closure, or the
    /// subscriber going away. Blocks the calling thread; must not be called
    /// from inside an async runtime.
    pub fn run(self, mut events: RawEventReceiver) {
        while let Some(event) = events.blocking_recv() {
            let id = event.id();
            let terminal = event.is_terminal();
            tracing::trace!(id = %id, kind = event.kind(), "relaying event");

            let message = self.translate(event);
            let failed = matches!(message, AsyncMessage::Error(_));
            if !self.emit(message) {
                return;
            }
            if failed {
                self.emit(AsyncMessage::End(AsyncEnd { id }));
            }
            if terminal {
                return;
            }
        }
        tracing::warn!(id = %self.id, "raw event stream closed without done");
        self.emit(AsyncMessage::End(AsyncEnd { id: self.id }));
    }

    fn translate(&self, event: RawEvent) -> AsyncMessage {
        match event {
            RawEvent::Status { id, code, .. } => AsyncMessage::Status(AsyncStatus {
                id,
                code: self.hooks.status_code(code),
            }),
            RawEvent::Headers { id, headers } => AsyncMessage::Headers(AsyncHeaders {
                id,
                headers: self.hooks.response_headers(headers),
            }),
            RawEvent::Chunk { id, chunk } => AsyncMessage::Chunk(AsyncChunk {
                id,
                chunk: self.hooks.response_chunk(chunk),
            }),
            RawEvent::Error { id, reason } => AsyncMessage::Error(AsyncError { id, reason }),
            RawEvent::Done { id } => AsyncMessage::End(AsyncEnd { id }),
        }
    }

    /// Returns `false` once the subscriber has dropped its inbox.
    fn emit(&self, message: AsyncMessage) -> bool {
        if self.subscriber.send(message).is_err() {
            tracing::debug!(id = %self.id, "subscriber gone, stopping transformer");
            return false;
        }
        true
    }
}
