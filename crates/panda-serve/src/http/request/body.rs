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

//! HTTP request body.

use serde_json::Value;

use crate::http::Method;

use super::error::{Error, Result};
use super::uri::Query;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP request body.
///
/// Bodies of `POST` and `PUT` requests are decoded according to their content
/// type, given that they're not empty. All other bodies are kept as raw bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Undecoded bytes.
    Raw(Vec<u8>),
    /// Decoded form or plain text key-value pairs.
    Form(Query),
    /// Decoded JSON value.
    Json(Value),
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Body {
    /// Decodes a body for the given method and content type.
    ///
    /// The media type is compared case-insensitively, ignoring parameters:
    ///
    /// - `application/x-www-form-urlencoded` and `text/plain` are decoded
    ///   as key-value pairs, following query string rules.
    /// - `application/json` is parsed strictly.
    /// - Everything else, including `application/xml`, is unsupported.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Json`], if a JSON body is malformed, and
    /// [`Error::UnsupportedContentType`] for bodies that can't be decoded.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::request::Body;
    /// use panda_serve::http::Method;
    ///
    /// // Decode form body
    /// let body = Body::decode(
    ///     Method::Post,
    ///     Some("application/x-www-form-urlencoded; charset=utf-8"),
    ///     b"name=panda&age=3".to_vec(),
    /// )?;
    /// assert_eq!(body.form().and_then(|form| form.get("age")), Some("3"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn decode(
        method: Method, content_type: Option<&str>, bytes: Vec<u8>,
    ) -> Result<Self> {
        if !method.decodes_body() || bytes.is_empty() {
            return Ok(Body::Raw(bytes));
        }

        // Extract media type without parameters for comparison
        let content_type = content_type.unwrap_or_default();
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        // Decode body according to media type
        match media_type.as_str() {
            "application/x-www-form-urlencoded" | "text/plain" => {
                let text = String::from_utf8_lossy(&bytes);
                Ok(Body::Form(Query::from(text.as_ref())))
            }
            "application/json" => {
                serde_json::from_slice(&bytes).map(Body::Json).map_err(Into::into)
            }
            _ => Err(Error::UnsupportedContentType(content_type.to_string())),
        }
    }

    /// Returns the raw bytes, if the body wasn't decoded.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the decoded key-value pairs, if any.
    #[inline]
    #[must_use]
    pub fn form(&self) -> Option<&Query> {
        match self {
            Body::Form(query) => Some(query),
            _ => None,
        }
    }

    /// Returns the decoded JSON value, if any.
    #[inline]
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Raw(bytes) => bytes.is_empty(),
            Body::Form(query) => query.is_empty(),
            Body::Json(_) => false,
        }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Body {
    /// Creates an empty body.
    #[inline]
    fn default() -> Self {
        Body::Raw(Vec::new())
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
    fn test_decode_raw() {
        let test_cases = vec![
            (Method::Get, Some("application/json"), b"{}".to_vec()),
            (Method::Delete, Some("text/plain"), b"a=1".to_vec()),
            (Method::Post, Some("application/xml"), Vec::new()),
        ];
        for (method, content_type, bytes) in test_cases {
            let body = Body::decode(method, content_type, bytes.clone());
            assert_eq!(body.ok(), Some(Body::Raw(bytes)));
        }
    }

    #[test]
    fn test_decode_form() {
        let body = Body::decode(Method::Put, Some("text/plain"), b"a=1&b".into());
        let form = body.ok().and_then(|body| body.form().cloned());
        assert_eq!(form, Some(Query::from_iter([("a", "1"), ("b", "")])));
    }

    #[test]
    fn test_decode_json() {
        let bytes = br#"{"msg":"hi","n":[1,2]}"#.to_vec();
        let body = Body::decode(Method::Post, Some("Application/JSON"), bytes);
        assert_eq!(
            body.ok().and_then(|body| body.json().cloned()),
            Some(json!({ "msg": "hi", "n": [1, 2] }))
        );

        // Malformed JSON is an error
        let bytes = b"{\"msg\":".to_vec();
        let body = Body::decode(Method::Post, Some("application/json"), bytes);
        assert!(matches!(body, Err(Error::Json(_))));
    }

    #[test]
    fn test_decode_unsupported() {
        let test_cases = vec![
            Some("application/xml"),
            Some("application/octet-stream"),
            None,
        ];
        for content_type in test_cases {
            let body = Body::decode(Method::Post, content_type, b"<a/>".into());
            assert!(matches!(body, Err(Error::UnsupportedContentType(_))));
        }
    }
}
