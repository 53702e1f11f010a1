//! Transport-level request types.
//!
//! # Design
//! These types describe a fully resolved request as plain data. The pipeline
//! builds a `TransportRequest` and hands it to a `Transport`; nothing here
//! touches the network. Headers are an ordered list of pairs so insertion
//! order and duplicates survive the trip to the transport.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::response::RequestId;
use crate::transformer::RawEventSender;

/// Ordered `(name, value)` header pairs. Duplicates are allowed.
pub type Headers = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transport option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Integer(i)
    }
}

impl From<u64> for OptionValue {
    fn from(i: u64) -> Self {
        OptionValue::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

/// Ordered option map handed to the transport.
///
/// Inserting an existing key replaces its value in place, so building from a
/// concatenated list gives last-one-wins semantics while keeping the position
/// of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportOptions(Vec<(String, OptionValue)>);

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(OptionValue::as_bool)
    }

    /// Read an integer option as milliseconds. Negative values are ignored.
    pub fn millis(&self, key: &str) -> Option<Duration> {
        self.get(key)
            .and_then(OptionValue::as_integer)
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.millis("connect_timeout")
    }

    pub fn is_async(&self) -> bool {
        self.flag("async").unwrap_or(false)
    }

    pub fn entries(&self) -> &[(String, OptionValue)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for TransportOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = TransportOptions::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

/// Where a streaming transport delivers raw events, and the id to tag them with.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub id: RequestId,
    pub sink: RawEventSender,
}

/// A fully resolved request described as plain data.
///
/// Built by the request pipeline. `url` always carries an explicit
/// `http://` or `https://` scheme. `stream_to` is set exactly when the
/// `async` option is set.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub options: TransportOptions,
    pub stream_to: Option<StreamTarget>,
}
