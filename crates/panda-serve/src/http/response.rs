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

//! HTTP response.

use serde_json::Value;
use std::fmt;

use super::component::{Header, Status};
use super::headers::Headers;

mod builder;
mod content;
mod error;
mod kind;

pub use builder::Builder;
pub use content::Content;
pub use error::{Error, Result};
pub use kind::{Kind, guess_media_type};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP response.
///
/// Responses are either assembled directly, using [`Response::new`] and the
/// chainable setters, or rendered from [`Content`] via [`Response::builder`],
/// which computes `Content-Type` and `Content-Length` from the [`Kind`] and
/// the rendered body. Header names are case-insensitive, and setting a header
/// twice replaces its value, so headers are never duplicated.
///
/// # Examples
///
/// ```
/// use panda_serve::http::{Header, Response, Status};
///
/// // Create response
/// let res = Response::new()
///     .status(Status::Ok)
///     .header(Header::ContentType, "text/plain")
///     .body("Hello, world!");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Response status.
    pub status: Status,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Response {
    /// Creates a response.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::Response;
    ///
    /// // Create response
    /// let res = Response::new();
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a response builder for the given kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::response::Kind;
    /// use panda_serve::http::Response;
    /// use serde_json::json;
    ///
    /// // Create response from JSON value
    /// let res = Response::builder(Kind::Json)
    ///     .content(json!({ "msg": "hi" }));
    /// assert_eq!(res.body, br#"{"msg":"hi"}"#);
    /// ```
    #[inline]
    #[must_use]
    pub fn builder(kind: Kind) -> Builder {
        Builder::new(kind)
    }

    /// Creates a plain text response for the given status.
    ///
    /// The body consists of the status code and name.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Response, Status};
    ///
    /// // Create response from status
    /// let res = Response::from_status(Status::NotFound);
    /// assert_eq!(res.body, b"404 Not Found");
    /// ```
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        Response::builder(Kind::Plain)
            .status(status)
            .content(status.to_string())
    }

    /// Creates a redirect to the given location.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Response, Status};
    ///
    /// // Create redirect
    /// let res = Response::redirect("/login");
    /// assert_eq!(res.status, Status::MovedPermanently);
    /// assert_eq!(res.headers.get(Header::Location), Some("/login"));
    /// ```
    #[must_use]
    pub fn redirect<L>(location: L) -> Self
    where
        L: ToString,
    {
        Response::builder(Kind::Raw)
            .status(Status::MovedPermanently)
            .header(Header::Location, location)
            .content(())
    }

    /// Creates a redirect from an optional URL and a body-shaped map.
    ///
    /// The location is taken from the URL, or otherwise from a `location`
    /// entry of the map. The status defaults to `301 Moved Permanently`, and
    /// can be overridden by a numeric `status_code` entry. Map keys are
    /// compared case-insensitively.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Location`], if neither a URL nor a location
    /// is given, and [`Error::Component`], if the status code is unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::{Header, Response, Status};
    /// use serde_json::json;
    ///
    /// // Create redirect from map
    /// let body = json!({ "Location": "/home", "status_code": 307 });
    /// let res = Response::try_redirect(None, Some(&body))?;
    /// assert_eq!(res.status, Status::TemporaryRedirect);
    /// assert_eq!(res.headers.get(Header::Location), Some("/home"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn try_redirect(
        url: Option<&str>, body: Option<&Value>,
    ) -> Result<Self> {
        let entry = |name: &str| {
            body.and_then(Value::as_object).and_then(|map| {
                map.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
        };

        // Obtain location from URL or map, which is required
        let location = url
            .or_else(|| entry("location").and_then(Value::as_str))
            .ok_or(Error::Location)?;

        // Obtain status from map, if given, and validate it
        let status = match entry("status_code").and_then(Value::as_u64) {
            Some(code) => Status::try_from(u16::try_from(code).unwrap_or(0))?,
            None => Status::MovedPermanently,
        };

        // Create redirect
        Ok(Response::builder(Kind::Raw)
            .status(status)
            .header(Header::Location, location)
            .content(()))
    }

    /// Returns the response as bytes.
    ///
    /// The body is omitted for statuses that don't permit one, i.e., for
    /// informational responses, `204 No Content` and `304 Not Modified`.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::response::Kind;
    /// use panda_serve::http::Response;
    ///
    /// // Create response and obtain bytes
    /// let res = Response::builder(Kind::Plain).content("Hi");
    /// assert_eq!(
    ///     res.into_bytes(),
    ///     b"HTTP/1.1 200 OK\r\n\
    ///       content-type: text/plain; charset=utf-8\r\n\
    ///       content-length: 2\r\n\r\nHi"
    /// );
    /// ```
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        // Compute an estimate for the response size - we know that we need 8
        // bytes for the HTTP/1.1 prefix + 36 bytes for the status code + info,
        // both with 2 bytes for the CRLF at the end. Then, for each header, we
        // estimate an average size of 64 bytes per header, and reserve just
        // enough space for the body + 2 bytes for the CRLF that precedes it.
        let capacity = (8 + 2)
            + 4 + 32 + 2 // fmt
            + self.headers.len() * 64 + 2 // fmt
            + self.body.len();

        // Create pre-sized buffer and append prefix and status
        let mut buffer = Vec::with_capacity(capacity);
        buffer.extend_from_slice(b"HTTP/1.1 ");
        buffer.extend_from_slice(self.status.to_string().as_bytes());
        buffer.extend_from_slice(b"\r\n");

        // Append all headers to buffer
        for (key, value) in &self.headers {
            buffer.extend_from_slice(key.as_bytes());
            buffer.extend_from_slice(b": ");
            buffer.extend_from_slice(value.as_bytes());
            buffer.extend_from_slice(b"\r\n");
        }

        // Append empty line and body to buffer, if permitted
        buffer.extend_from_slice(b"\r\n");
        if self.status.permits_body() {
            buffer.extend_from_slice(&self.body);
        }

        // Return buffer
        buffer
    }
}

impl Response {
    /// Sets the status of the response.
    #[inline]
    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Adds a header to the response.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Response};
    ///
    /// // Create response and add header
    /// let res = Response::new()
    ///     .header(Header::CacheControl, "no-cache");
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

    /// Sets the body of the response.
    ///
    /// Note that this doesn't update the `Content-Length` header.
    #[inline]
    #[must_use]
    pub fn body<B>(mut self, body: B) -> Self
    where
        B: Into<Vec<u8>>,
    {
        self.body = body.into();
        self
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Response {
    /// Creates a default response.
    #[inline]
    fn default() -> Self {
        Self {
            status: Status::Ok,
            headers: Headers::default(),
            body: Vec::default(),
        }
    }
}

// ----------------------------------------------------------------------------

impl fmt::Display for Response {
    /// Formats the response for display.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HTTP/1.1 {}\r\n", self.status)?;
        write!(f, "{}\r\n", self.headers)?;
        write!(f, "[Body: {} bytes]\r\n", self.body.len())
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
    fn test_try_redirect() {
        let body = json!({ "LOCATION": "/b", "status_code": 302 });
        let test_cases = vec![
            (Some("/a"), None, Status::MovedPermanently, "/a"),
            (Some("/a"), Some(&body), Status::Found, "/a"),
            (None, Some(&body), Status::Found, "/b"),
        ];
        for (url, body, status, location) in test_cases {
            let res = Response::try_redirect(url, body).unwrap();
            assert_eq!(res.status, status);
            assert_eq!(res.headers.get(Header::Location), Some(location));
            assert_eq!(res.headers.get(Header::ContentLength), Some("0"));
        }
    }

    #[test]
    fn test_try_redirect_errors() {
        let body = json!({ "url": "/a" });
        let res = Response::try_redirect(None, Some(&body));
        assert!(matches!(res, Err(Error::Location)));
        assert!(matches!(
            Response::try_redirect(None, None),
            Err(Error::Location)
        ));

        // Unknown status codes are rejected
        let body = json!({ "location": "/a", "status_code": 399 });
        let res = Response::try_redirect(None, Some(&body));
        assert!(matches!(res, Err(Error::Component(_))));
    }

    #[test]
    fn test_into_bytes_without_body() {
        let res = Response::new()
            .status(Status::NotModified)
            .body("stale");
        assert_eq!(res.into_bytes(), b"HTTP/1.1 304 Not Modified\r\n\r\n");
    }
}
