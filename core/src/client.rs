//! Caller-facing HTTP client.
//!
//! # Design
//! `Client` owns a `Transport`, the `Hooks` and a `ClientConfig`, and carries no
//! mutable state between calls. `request` runs the pipeline, hands the result
//! to the transport and either builds a `Response` (buffered mode) or returns
//! an `AsyncResponse` handle as soon as the transport accepts the stream.
//! There are no retries: transport failures surface on the first attempt.

use crate::error::HttpError;
use crate::hooks::Hooks;
use crate::http::{Headers, Method};
use crate::options::{ClientConfig, Options};
use crate::pipeline::build_request;
use crate::response::{AsyncResponse, Reply, Response};
use crate::transport::{Transport, TransportReply};

#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
    hooks: Hooks,
    config: ClientConfig,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            hooks: Hooks::default(),
            config,
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue a request.
    ///
    /// Without `options.stream_to` this blocks until the transport returns and
    /// yields `Reply::Sync`. With it, this returns `Reply::Async` once the
    /// transport hands back a handle; events then arrive at the subscriber.
    /// If the transport rejects a streaming call, the error is returned here
    /// and the subscriber still receives `AsyncError` followed by `AsyncEnd`.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        body: impl Into<Vec<u8>>,
        headers: Headers,
        options: Options,
    ) -> Result<Reply, HttpError> {
        let prepared = build_request(method, url, body.into(), headers, options, &self.hooks, &self.config)?;
        let stream = prepared.stream;
        let reply = self.transport.send(prepared.request);

        match (reply, stream) {
            (Ok(TransportReply::Complete(result)), None) => Ok(Reply::Sync(Response::new(
                self.hooks.status_code(result.status),
                self.hooks.response_headers(result.headers),
                self.hooks.response_body(result.body),
            ))),
            (Ok(TransportReply::Streaming(id)), Some(stream)) if id == stream.id => {
                Ok(Reply::Async(AsyncResponse { id }))
            }
            (Ok(TransportReply::Streaming(id)), Some(stream)) => {
                tracing::warn!(expected = %stream.id, actual = %id, "transport returned a different stream id");
                let message = format!("transport returned stream {id}, expected {}", stream.id);
                stream.fail(message.clone());
                Err(HttpError::Protocol(message))
            }
            (Ok(TransportReply::Streaming(id)), None) => Err(HttpError::Protocol(format!(
                "transport opened stream {id} for a buffered request"
            ))),
            (Ok(TransportReply::Complete(_)), Some(stream)) => {
                let message = "transport returned a buffered result for a streaming request";
                stream.fail(message);
                Err(HttpError::Protocol(message.to_string()))
            }
            (Err(err), stream) => {
                tracing::debug!(method = %method, error = %err, "request failed");
                if let Some(stream) = stream {
                    stream.fail(err.reason());
                }
                Err(err.into())
            }
        }
    }

    /// Issue a request that must not stream, returning the buffered response.
    pub fn fetch(
        &self,
        method: Method,
        url: &str,
        body: impl Into<Vec<u8>>,
        headers: Headers,
        mut options: Options,
    ) -> Result<Response, HttpError> {
        options.stream_to = None;
        self.request(method, url, body, headers, options)?
            .into_response()
            .ok_or_else(|| HttpError::Protocol("expected a buffered response".to_string()))
    }

    pub fn get(&self, url: &str, headers: Headers, options: Options) -> Result<Reply, HttpError> {
        self.request(Method::Get, url, Vec::new(), headers, options)
    }

    pub fn head(&self, url: &str, headers: Headers, options: Options) -> Result<Reply, HttpError> {
        self.request(Method::Head, url, Vec::new(), headers, options)
    }

    pub fn delete(&self, url: &str, headers: Headers, options: Options) -> Result<Reply, HttpError> {
        self.request(Method::Delete, url, Vec::new(), headers, options)
    }

    pub fn options(&self, url: &str, headers: Headers, options: Options) -> Result<Reply, HttpError> {
        self.request(Method::Options, url, Vec::new(), headers, options)
    }

    pub fn post(
        &self,
        url: &str,
        body: impl Into<Vec<u8>>,
        headers: Headers,
        options: Options,
    ) -> Result<Reply, HttpError> {
        self.request(Method::Post, url, body, headers, options)
    }

    pub fn put(
        &self,
        url: &str,
        body: impl Into<Vec<u8>>,
        headers: Headers,
        options: Options,
    ) -> Result<Reply, HttpError> {
        self.request(Method::Put, url, body, headers, options)
    }

    pub fn patch(
        &self,
        url: &str,
        body: impl Into<Vec<u8>>,
        headers: Headers,
        options: Options,
    ) -> Result<Reply, HttpError> {
        self.request(Method::Patch, url, body, headers, options)
    }
}
