// Copyright (c) 2025 Zensical and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! HTTP request.

use std::borrow::Cow;
use std::fmt;
use std::str;

use super::component::{Header, Method, Status};
use super::headers::Headers;

mod body;
mod cookies;
mod error;
mod uri;

pub use body::Body;
pub use cookies::Cookies;
pub use error::{Error, Result};
pub use uri::{Query, Uri};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Maximum size of the header block.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Maximum size of the body.
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Maximum length of the request target.
const MAX_TARGET_LENGTH: usize = 2 * 1024;

/// Maximum length of a header value.
const MAX_HEADER_LENGTH: usize = 4 * 1024;

/// Header block terminator.
const TERMINATOR: &[u8] = b"\r\n\r\n";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP request.
///
/// Requests are parsed in two steps, as the length of the body is only known
/// after the header block was parsed. [`Request::from_head`] parses the header
/// block as soon as it's complete, and [`Request::with_body`] attaches the body
/// once [`Request::content_length`] bytes were received, decoding it according
/// to the method and content type. [`Request::from_bytes`] combines both steps
/// for buffers that already contain the entire request.
///
/// Parsing is deliberately lenient about the request line: a line with only
/// method and target defaults the protocol to `HTTP/1.1`, and a line that is
/// otherwise malformed is treated as `GET / HTTP/1.1`.
///
/// # Examples
///
/// ```
/// use panda_serve::http::{Header, Method, Request};
///
/// // Create request
/// let req = Request::new()
///     .method(Method::Get)
///     .uri("/search?q=panda")
///     .header(Header::Accept, "text/html");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request protocol, e.g. `HTTP/1.1`.
    pub protocol: String,
    /// Request headers, without the `Cookie` header.
    pub headers: Headers,
    /// Request cookies.
    pub cookies: Cookies,
    /// Request body.
    pub body: Body,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Request {
    /// Creates a request.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::Request;
    ///
    /// // Create request
    /// let req = Request::new();
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a request from the given bytes.
    ///
    /// The buffer must contain the entire request, i.e., the header block and
    /// at least as many body bytes as announced by `Content-Length`.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Incomplete`], if the buffer contained
    /// insufficient data, and all errors of [`Request::from_head`] and
    /// [`Request::with_body`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::{Method, Request};
    ///
    /// // Create request from bytes
    /// let req = Request::from_bytes(b"GET /?page=2 HTTP/1.1\r\n\r\n")?;
    /// assert_eq!(req.method, Method::Get);
    /// assert_eq!(req.uri.path, "/");
    /// assert_eq!(req.uri.query.get("page"), Some("2"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (req, offset) = Self::from_head(bytes)?.ok_or(Error::Incomplete)?;
        let length = req.content_length()?;
        match bytes.get(offset..offset + length) {
            Some(body) => req.with_body(body.to_vec()),
            None => Err(Error::Incomplete),
        }
    }

    /// Creates a request from the header block contained in the given bytes.
    ///
    /// Returns [`None`], if the header block is not complete yet, or the
    /// request together with the offset at which the body starts. The header
    /// block is decoded as UTF-8, falling back to Latin-1 if that fails, so
    /// parsing never fails on encoding alone.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Validation`], if the header block, target
    /// or a header value exceeds the safe limits, or the target isn't a path,
    /// and [`Error::Component`], if the method is unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::Request;
    ///
    /// // Attempt to create request from incomplete bytes
    /// assert!(Request::from_head(b"GET / HTTP/1.1\r\n")?.is_none());
    ///
    /// // Create request from header block
    /// let head = Request::from_head(b"GET /\r\nHost: a\r\n\r\nbody")?;
    /// if let Some((req, offset)) = head {
    ///     assert_eq!(req.protocol, "HTTP/1.1");
    ///     assert_eq!(req.headers.get("host"), Some("a"));
    ///     assert_eq!(offset, 18);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_head(bytes: &[u8]) -> Result<Option<(Self, usize)>> {
        let position = bytes
            .windows(TERMINATOR.len())
            .position(|window| window == TERMINATOR);

        // Ensure that the header block doesn't exceed the limit, regardless of
        // whether it's complete, or we might buffer indefinitely
        let Some(end) = position else {
            if bytes.len() > MAX_HEAD_SIZE {
                let status = Status::RequestHeaderFieldsTooLarge;
                return Err(Error::Validation(status));
            }
            return Ok(None);
        };
        if end > MAX_HEAD_SIZE {
            let status = Status::RequestHeaderFieldsTooLarge;
            return Err(Error::Validation(status));
        }

        // Decode header block, and split off the request line
        let head = decode_head(&bytes[..end]);
        let mut lines = head.split("\r\n");
        let line = lines.next().unwrap_or_default();

        // Parse request line, defaulting to the root if it's malformed
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let (method, target, protocol) = match tokens.as_slice() {
            [method, target, protocol] => (*method, *target, *protocol),
            [method, target] => (*method, *target, "HTTP/1.1"),
            _ => ("GET", "/", "HTTP/1.1"),
        };

        // Ensure that the request target is an origin-form path of sane length,
        // as we do not support proxy requests, and probably never will
        if target.len() > MAX_TARGET_LENGTH {
            return Err(Error::Validation(Status::UriTooLong));
        }
        if !target.starts_with('/') {
            return Err(Error::Validation(Status::BadRequest));
        }

        // Parse headers, skipping all lines that are not key-value pairs
        let mut headers = Headers::new();
        for line in lines {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            // Ensure header value field doesn't exceed 4kb, which is more than
            // enough for any sane header value, including cookies and tokens
            let (key, value) = (key.trim(), value.trim());
            if value.len() > MAX_HEADER_LENGTH {
                let status = Status::RequestHeaderFieldsTooLarge;
                return Err(Error::Validation(status));
            }
            if !key.is_empty() {
                headers.insert(key, value);
            }
        }

        // Extract cookies, which are removed from the headers
        let cookies = headers
            .remove(Header::Cookie)
            .map(|value| Cookies::from(value.as_str()))
            .unwrap_or_default();

        // Create request without body, which is attached later on
        let req = Request {
            method: method.parse()?,
            uri: Uri::from(target),
            protocol: protocol.to_string(),
            headers,
            cookies,
            body: Body::default(),
        };
        Ok(Some((req, end + TERMINATOR.len())))
    }

    /// Returns the announced length of the body.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Validation`], if the `Content-Length`
    /// header is not a number, or exceeds the maximum body size.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::{Header, Request};
    ///
    /// // Create request and obtain body length
    /// let req = Request::new()
    ///     .header(Header::ContentLength, 42);
    /// assert_eq!(req.content_length()?, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub fn content_length(&self) -> Result<usize> {
        let Some(value) = self.headers.get(Header::ContentLength) else {
            return Ok(0);
        };

        // Parse length and ensure it doesn't exceed the limit
        let length = value
            .parse::<usize>()
            .map_err(|_| Error::Validation(Status::BadRequest))?;
        if length > MAX_BODY_SIZE {
            Err(Error::Validation(Status::PayloadTooLarge))
        } else {
            Ok(length)
        }
    }

    /// Attaches and decodes the given body.
    ///
    /// # Errors
    ///
    /// This method returns all errors of [`Body::decode`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::{Header, Method, Request};
    ///
    /// // Create request and attach body
    /// let req = Request::new()
    ///     .method(Method::Post)
    ///     .header(Header::ContentType, "application/json")
    ///     .with_body(br#"{"msg":"hi"}"#.to_vec())?;
    /// assert!(req.body.json().is_some());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_body(mut self, bytes: Vec<u8>) -> Result<Self> {
        let content_type = self.headers.get(Header::ContentType);
        self.body = Body::decode(self.method, content_type, bytes)?;
        Ok(self)
    }
}

impl Request {
    /// Sets the method of the request.
    #[inline]
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI of the request.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::Request;
    ///
    /// // Create request and set URI
    /// let req = Request::new()
    ///     .uri("/static/app.js");
    /// ```
    #[inline]
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = Uri::from(uri);
        self
    }

    /// Adds a header to the request.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Request};
    ///
    /// // Create request and add header
    /// let req = Request::new()
    ///     .header(Header::AcceptEncoding, "gzip");
    /// ```
    #[inline]
    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: ToString,
    {
        self.headers.insert(key, value);
        self
    }

    /// Sets the body of the request, without decoding it.
    #[inline]
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Request {
    /// Creates a default request.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::Request;
    ///
    /// // Create request
    /// let req = Request::default();
    /// ```
    #[inline]
    fn default() -> Self {
        Self {
            method: Method::Get,
            uri: Uri::default(),
            protocol: String::from("HTTP/1.1"),
            headers: Headers::default(),
            cookies: Cookies::default(),
            body: Body::default(),
        }
    }
}

// ----------------------------------------------------------------------------

impl fmt::Display for Request {
    /// Formats the request for display.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.uri, self.protocol)?;
        write!(f, "{}\r\n", self.headers)?;
        match &self.body {
            Body::Raw(bytes) => write!(f, "[Body: {} bytes]\r\n", bytes.len()),
            Body::Form(query) => write!(f, "[Form: {query}]\r\n"),
            Body::Json(value) => write!(f, "[JSON: {value}]\r\n"),
        }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Decodes a header block as UTF-8, falling back to Latin-1.
fn decode_head(bytes: &[u8]) -> Cow<'_, str> {
    match str::from_utf8(bytes) {
        Ok(head) => Cow::Borrowed(head),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_line() {
        let test_cases = vec![
            ("GET /a HTTP/1.0", Method::Get, "/a", "HTTP/1.0"),
            ("post /a", Method::Post, "/a", "HTTP/1.1"),
            ("GARBAGE", Method::Get, "/", "HTTP/1.1"),
            ("", Method::Get, "/", "HTTP/1.1"),
            ("GET /a HTTP/1.1 extra", Method::Get, "/", "HTTP/1.1"),
        ];
        for (line, method, path, protocol) in test_cases {
            let bytes = format!("{line}\r\n\r\n");
            let req = Request::from_bytes(bytes.as_bytes()).unwrap();
            assert_eq!(req.method, method, "{line}");
            assert_eq!(req.uri.path, path, "{line}");
            assert_eq!(req.protocol, protocol, "{line}");
        }
    }

    #[test]
    fn test_headers() {
        let bytes = b"GET / HTTP/1.1\r\n\
            Content-Type:  text/html \r\n\
            not a header\r\n\
            X-Empty:\r\n\
            Cookie: id=7; name=a%20b\r\n\r\n";
        let req = Request::from_bytes(bytes).unwrap();
        assert_eq!(req.headers.get("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(req.headers.get("x-empty"), Some(""));
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.cookies.get("id"), Some("7"));
        assert_eq!(req.cookies.get("name"), Some("a b"));
        assert!(!req.headers.contains(Header::Cookie));
    }

    #[test]
    fn test_latin1_fallback() {
        let bytes = b"GET / HTTP/1.1\r\nX-Name: J\xf6rg\r\n\r\n";
        let req = Request::from_bytes(bytes).unwrap();
        assert_eq!(req.headers.get("x-name"), Some("Jörg"));
    }

    #[test]
    fn test_target() {
        let bytes = b"GET /caf%C3%A9/a+b?q=1+2&q=3#frag HTTP/1.1\r\n\r\n";
        let req = Request::from_bytes(bytes).unwrap();
        assert_eq!(req.uri.path, "/café/a+b");
        assert_eq!(req.uri.query.get("q"), Some("3"));
    }

    #[test]
    fn test_body() {
        let bytes = b"POST /echo HTTP/1.1\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 12\r\n\r\n\
            {\"msg\":\"hi\"}trailing";
        let req = Request::from_bytes(bytes).unwrap();
        assert_eq!(req.body, Body::Json(json!({ "msg": "hi" })));

        // Bodies of other methods are kept as is
        let bytes = b"DELETE / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let req = Request::from_bytes(bytes).unwrap();
        assert_eq!(req.body, Body::Raw(b"abc".to_vec()));
    }

    #[test]
    fn test_errors() {
        let test_cases: Vec<(&[u8], Status)> = vec![
            (b"GET / HTTP/1.1\r\n", Status::BadRequest),
            (b"BREW / HTTP/1.1\r\n\r\n", Status::NotImplemented),
            (b"GET a HTTP/1.1\r\n\r\n", Status::BadRequest),
            (
                b"POST / HTTP/1.1\r\nContent-Length: x\r\n\r\n",
                Status::BadRequest,
            ),
            (
                b"POST / HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n",
                Status::PayloadTooLarge,
            ),
            (
                b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\na=",
                Status::BadRequest,
            ),
            (
                b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\n<a>",
                Status::UnsupportedMediaType,
            ),
        ];
        for (bytes, status) in test_cases {
            let err = Request::from_bytes(bytes).unwrap_err();
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn test_limits() {
        let target = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(4096));
        let err = Request::from_bytes(target.as_bytes()).unwrap_err();
        assert_eq!(err.status(), Status::UriTooLong);

        // Header block without terminator exceeding the limit
        let head = vec![b'a'; MAX_HEAD_SIZE + 1];
        let err = Request::from_head(&head).unwrap_err();
        assert_eq!(err.status(), Status::RequestHeaderFieldsTooLarge);
    }
}
