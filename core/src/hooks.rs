//! Customisation seams applied to request and response data.
//!
//! Every hook defaults to identity. A `Hooks` value is injected once at client
//! construction and shared (cheaply cloned) with each event transformer.

use std::fmt;
use std::sync::Arc;

use crate::http::Headers;
use crate::options::Options;

/// A pass-through transform over `T`.
pub type Transform<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

#[derive(Clone, Default)]
pub struct Hooks {
    pub process_url: Option<Transform<String>>,
    pub process_request_body: Option<Transform<Vec<u8>>>,
    pub process_request_headers: Option<Transform<Headers>>,
    pub process_options: Option<Transform<Options>>,
    pub process_status_code: Option<Transform<u16>>,
    pub process_response_headers: Option<Transform<Headers>>,
    pub process_response_body: Option<Transform<Vec<u8>>>,
    pub process_response_chunk: Option<Transform<Vec<u8>>>,
}

fn apply<T>(hook: &Option<Transform<T>>, value: T) -> T {
    match hook {
        Some(f) => f(value),
        None => value,
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_url(mut self, f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        self.process_url = Some(Arc::new(f));
        self
    }

    pub fn on_request_body(mut self, f: impl Fn(Vec<u8>) -> Vec<u8> + Send + Sync + 'static) -> Self {
        self.process_request_body = Some(Arc::new(f));
        self
    }

    pub fn on_request_headers(mut self, f: impl Fn(Headers) -> Headers + Send + Sync + 'static) -> Self {
        self.process_request_headers = Some(Arc::new(f));
        self
    }

    pub fn on_options(mut self, f: impl Fn(Options) -> Options + Send + Sync + 'static) -> Self {
        self.process_options = Some(Arc::new(f));
        self
    }

    pub fn on_status_code(mut self, f: impl Fn(u16) -> u16 + Send + Sync + 'static) -> Self {
        self.process_status_code = Some(Arc::new(f));
        self
    }

    pub fn on_response_headers(mut self, f: impl Fn(Headers) -> Headers + Send + Sync + 'static) -> Self {
        self.process_response_headers = Some(Arc::new(f));
        self
    }

    pub fn on_response_body(mut self, f: impl Fn(Vec<u8>) -> Vec<u8> + Send + Sync + 'static) -> Self {
        self.process_response_body = Some(Arc::new(f));
        self
    }

    pub fn on_response_chunk(mut self, f: impl Fn(Vec<u8>) -> Vec<u8> + Send + Sync + 'static) -> Self {
        self.process_response_chunk = Some(Arc::new(f));
        self
    }

    pub fn url(&self, url: String) -> String {
        apply(&self.process_url, url)
    }

    pub fn request_body(&self, body: Vec<u8>) -> Vec<u8> {
        apply(&self.process_request_body, body)
    }

    pub fn request_headers(&self, headers: Headers) -> Headers {
        apply(&self.process_request_headers, headers)
    }

    pub fn options(&self, options: Options) -> Options {
        apply(&self.process_options, options)
    }

    pub fn status_code(&self, code: u16) -> u16 {
        apply(&self.process_status_code, code)
    }

    pub fn response_headers(&self, headers: Headers) -> Headers {
        apply(&self.process_response_headers, headers)
    }

    pub fn response_body(&self, body: Vec<u8>) -> Vec<u8> {
        apply(&self.process_response_body, body)
    }

    pub fn response_chunk(&self, chunk: Vec<u8>) -> Vec<u8> {
        apply(&self.process_response_chunk, chunk)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("process_url", &self.process_url.is_some())
            .field("process_request_body", &self.process_request_body.is_some())
            .field("process_request_headers", &self.process_request_headers.is_some())
            .field("process_options", &self.process_options.is_some())
            .field("process_status_code", &self.process_status_code.is_some())
            .field("process_response_headers", &self.process_response_headers.is_some())
            .field("process_response_body", &self.process_response_body.is_some())
            .field("process_response_chunk", &self.process_response_chunk.is_some())
            .finish()
    }
}
