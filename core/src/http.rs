//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and reads `HttpResponse` values without
//! ever touching the network; the injected `Session` performs the actual I/O
//! (and signing). Paths are relative to the API host, so the same request
//! can be replayed against production, a proxy, or the mock server.
//!
//! Bodies are raw bytes because content bundles are gzip archives; JSON and
//! plain-text bodies are just the UTF-8 case.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

/// Header names, lowercase as they go over the wire.
pub const CONTENT_TYPE: &str = "content-type";
pub const ACCEPT: &str = "accept";
/// Seconds to wait before a scheduled namespace delete may be changed.
pub const RETRY_AFTER: &str = "retry-after";

/// Body of every JSON request and of JSON item values.
pub const APPLICATION_JSON: &str = "application/json";
/// Content bundles, both uploaded and downloaded.
pub const APPLICATION_GZIP: &str = "application/gzip";
/// Item values that are not JSON.
pub const TEXT_PLAIN: &str = "text/plain";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` carries the path and the encoded query string, e.g.
/// `/edgeworkers/v1/ids/42/activations?version=1.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Upper bound for the whole round-trip. A session must fail the
    /// request with a `TransportError` once it is exceeded.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// A request with no headers, body or timeout.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Append a header; earlier headers with the same name are kept.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a body together with its `content-type` header.
    pub fn with_body(self, content_type: &str, body: Vec<u8>) -> Self {
        let mut req = self.with_header(CONTENT_TYPE, content_type);
        req.body = Some(body);
        req
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The path without its query string.
    pub fn path_only(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// The raw (still encoded) query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Session` after executing an `HttpRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code as received.
    pub status: u16,
    /// Headers in the order the session read them.
    pub headers: Vec<(String, String)>,
    /// Fully read body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Query parameters, encoded sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Query {
    params: BTreeMap<&'static str, String>,
}

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        self.params.insert(key, value.into());
        self
    }

    /// Add `key` only when the caller supplied a non-empty value.
    pub(crate) fn add_non_empty(&mut self, key: &'static str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.add(key, value);
        }
        self
    }

    pub(crate) fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the encoded query to `path`, or return `path` unchanged when empty.
    pub(crate) fn append_to(&self, path: String) -> String {
        if self.params.is_empty() {
            path
        } else {
            format!("{path}?{}", self.encode())
        }
    }
}

/// Percent-encode a single path segment, `/` included.
pub(crate) fn encode_path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
