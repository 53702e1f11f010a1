//! URL shaping applied before a request reaches the transport.
//!
//! Nothing here validates URLs. A malformed target is passed through and the
//! transport reports the failure.

use crate::error::HttpError;

const HTTP: &str = "http://";
const HTTPS: &str = "https://";

/// Ensure `url` carries an explicit scheme.
///
/// Returns `url` unchanged when it starts with `http://` or `https://`
/// (compared case-insensitively), otherwise prefixes `http://`.
pub fn normalize(url: &str) -> String {
    if has_scheme(url) {
        url.to_string()
    } else {
        format!("{HTTP}{url}")
    }
}

pub fn has_scheme(url: &str) -> bool {
    starts_with_ignore_case(url, HTTP) || starts_with_ignore_case(url, HTTPS)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

/// Join `url` onto `base` unless `url` already names its own scheme.
pub fn join_base(base: &str, url: &str) -> String {
    if has_scheme(url) {
        return url.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = url.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Append form-urlencoded `query` pairs, respecting an existing query string.
///
/// A `#fragment` stays at the end, after the query.
pub fn append_query(url: &str, query: &[(String, String)]) -> Result<String, HttpError> {
    if query.is_empty() {
        return Ok(url.to_string());
    }
    let encoded = serde_urlencoded::to_string(query)?;
    let (base, fragment) = match url.find('#') {
        Some(at) => url.split_at(at),
        None => (url, ""),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    Ok(format!("{base}{separator}{encoded}{fragment}"))
}
