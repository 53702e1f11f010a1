//! Per-call `Options` and per-client `ClientConfig`.
//!
//! # Design
//! `Options` carries what varies per request (timeout, streaming subscriber,
//! query, auth, transport overrides). `ClientConfig` carries defaults shared by
//! every call and can be loaded from JSON. Both feed `resolve_transport_options`,
//! which produces the last-one-wins option map the transport sees.

use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::http::{Headers, OptionValue, TransportOptions};
use crate::response::Subscriber;

/// Connect timeout applied when neither the call nor the client sets one.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Options for a single request.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Connect timeout in milliseconds. Absent or non-positive means the
    /// client default.
    pub timeout: Option<i64>,
    /// Enables streaming mode; events are delivered here.
    pub stream_to: Option<Subscriber>,
    /// Transport-specific overrides, appended after the derived defaults.
    pub transport: Vec<(String, OptionValue)>,
    pub query: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
    pub follow_redirects: Option<bool>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, millis: i64) -> Self {
        self.timeout = Some(millis);
        self
    }

    pub fn stream_to(mut self, subscriber: Subscriber) -> Self {
        self.stream_to = Some(subscriber);
        self
    }

    pub fn transport_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.transport.push((key.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.stream_to.is_some()
    }

    /// The effective timeout: `self.timeout` if positive, else `default_ms`.
    pub fn resolved_timeout(&self, default_ms: u64) -> u64 {
        match self.timeout {
            Some(ms) if ms > 0 => ms as u64,
            _ => default_ms,
        }
    }
}

/// Client-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Prepended to request URLs that carry no scheme.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    /// Sent ahead of each request's own headers.
    pub default_headers: Headers,
    /// Transport overrides placed before each call's own overrides.
    pub transport: Vec<(String, OptionValue)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_headers: Vec::new(),
            transport: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self, HttpError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout_ms(mut self, millis: u64) -> Self {
        self.timeout_ms = millis;
        self
    }

    /// The client-wide timeout, with zero meaning `DEFAULT_TIMEOUT_MS`.
    pub fn effective_timeout_ms(&self) -> u64 {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        }
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

/// Build the transport option map for one call.
///
/// Order is `[connect_timeout] ++ config.transport ++ options.transport`, then
/// `follow_redirects` when requested, then `async = true` for streaming calls.
/// Later entries win, so explicit overrides beat the derived connect timeout
/// and a streaming call is always async.
pub fn resolve_transport_options(config: &ClientConfig, options: &Options) -> TransportOptions {
    let timeout = options.resolved_timeout(config.effective_timeout_ms());
    let mut resolved = TransportOptions::new();
    resolved.insert("connect_timeout", timeout);
    for (key, value) in config.transport.iter().chain(&options.transport) {
        resolved.insert(key.clone(), value.clone());
    }
    if let Some(follow) = options.follow_redirects {
        resolved.insert("follow_redirects", follow);
    }
    if options.is_streaming() {
        resolved.insert("async", true);
    }
    resolved
}
