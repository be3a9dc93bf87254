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

//! HTTP response builder.

use crate::http::{Header, Headers, Status};

use super::content::Content;
use super::kind::Kind;
use super::Response;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP response builder.
///
/// The builder renders [`Content`] according to a [`Kind`] and computes the
/// headers against the final header set: `Content-Type` is only added if it's
/// not already present, with `; charset=utf-8` appended to `text/*` media
/// types lacking a charset, and `Content-Length` is only added if the status
/// permits a body and the header isn't present yet.
///
/// # Examples
///
/// ```
/// use panda_serve::http::response::Kind;
/// use panda_serve::http::{Header, Response, Status};
///
/// // Create response from content
/// let res = Response::builder(Kind::Html)
///     .status(Status::Created)
///     .content("<h1>Hi</h1>");
///
/// // Obtain computed headers
/// let content_type = res.headers.get(Header::ContentType);
/// assert_eq!(content_type, Some("text/html; charset=utf-8"));
/// assert_eq!(res.headers.get(Header::ContentLength), Some("11"));
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    /// Response kind.
    kind: Kind,
    /// Response status.
    status: Status,
    /// Media type overriding the kind's media type.
    media_type: Option<String>,
    /// Response headers.
    headers: Headers,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Builder {
    /// Creates a response builder.
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            status: Status::Ok,
            media_type: None,
            headers: Headers::new(),
        }
    }

    /// Sets the status of the response.
    #[inline]
    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets the media type, overriding the media type of the kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::response::Kind;
    /// use panda_serve::http::{Header, Response};
    ///
    /// // Create response with custom media type
    /// let res = Response::builder(Kind::Binary)
    ///     .media_type("text/markdown; charset=latin-1")
    ///     .content("# Hi");
    ///
    /// // Obtain computed header
    /// let content_type = res.headers.get(Header::ContentType);
    /// assert_eq!(content_type, Some("text/markdown; charset=latin-1"));
    /// ```
    #[inline]
    #[must_use]
    pub fn media_type<S>(mut self, media_type: S) -> Self
    where
        S: Into<String>,
    {
        self.media_type = Some(media_type.into());
        self
    }

    /// Adds a header to the response.
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

    /// Adds the given headers to the response.
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Renders the content and creates the response.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::response::Kind;
    /// use panda_serve::http::{Header, Response, Status};
    ///
    /// // Create response without body
    /// let res = Response::builder(Kind::Plain)
    ///     .status(Status::NoContent)
    ///     .content(());
    ///
    /// // Ensure no content length is computed
    /// assert!(!res.headers.contains(Header::ContentLength));
    /// ```
    #[must_use]
    pub fn content<C>(self, content: C) -> Response
    where
        C: Into<Content>,
    {
        let body = content.into().render(self.kind);
        let mut headers = self.headers;

        // Compute content type, if a media type is set, and append a charset
        // to textual media types, so clients don't have to guess
        let media_type = self.media_type.or_else(|| {
            self.kind.media_type().map(String::from)
        });
        if let Some(media_type) = media_type {
            let is_text = media_type.starts_with("text/");
            let value = if is_text && !has_charset(&media_type) {
                format!("{media_type}; charset=utf-8")
            } else {
                media_type
            };
            headers.insert_default(Header::ContentType, value);
        }

        // Compute content length, unless the status forbids a body
        if self.status.permits_body() {
            headers.insert_default(Header::ContentLength, body.len());
        }

        // Return response
        Response { status: self.status, headers, body }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns whether the given media type carries a charset parameter.
fn has_charset(media_type: &str) -> bool {
    media_type.split(';').skip(1).any(|param| {
        param.trim().to_ascii_lowercase().starts_with("charset=")
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_content_length() {
        let test_cases: Vec<Content> = vec![
            Content::Empty,
            Content::from("héllo"),
            Content::from(json!({ "msg": "hi", "list": [1, 2, 3] })),
            Content::from(vec![0; 1000]),
        ];
        for content in test_cases {
            let res = Builder::new(Kind::Json).content(content);
            let length = res.headers.get(Header::ContentLength);
            assert_eq!(length, Some(res.body.len().to_string().as_str()));
        }
    }

    #[test]
    fn test_explicit_headers() {
        let headers = Headers::from_iter([
            ("content-type", "application/vnd.api+json"),
            ("content-length", "7"),
        ]);
        let res = Builder::new(Kind::Json)
            .headers(&headers)
            .content(json!({}));
        assert_eq!(
            res.headers.get("Content-Type"),
            Some("application/vnd.api+json")
        );
        assert_eq!(res.headers.get("Content-Length"), Some("7"));
        assert_eq!(res.headers.len(), 2);
    }

    #[test]
    fn test_media_type() {
        let test_cases = vec![
            (Kind::Raw, None),
            (Kind::Plain, Some("text/plain; charset=utf-8")),
            (Kind::Css, Some("text/css; charset=utf-8")),
            (Kind::Json, Some("application/json")),
            (Kind::Ico, Some("image/vnd.microsoft.icon")),
        ];
        for (kind, expected) in test_cases {
            let res = Builder::new(kind).content("x");
            assert_eq!(res.headers.get(Header::ContentType), expected);
        }
    }

    #[test]
    fn test_status_without_body() {
        for status in [Status::Continue, Status::NoContent, Status::NotModified]
        {
            let res = Builder::new(Kind::Plain).status(status).content(());
            assert!(!res.headers.contains(Header::ContentLength));
        }
    }
}
