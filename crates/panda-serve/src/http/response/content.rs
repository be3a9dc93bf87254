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

//! HTTP response content.

use serde::Serialize;
use serde_json::Value;

use super::error::{Error, Result};
use super::kind::Kind;

mod finite;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP response content.
///
/// Content is what endpoints return when they don't build a [`Response`][]
/// themselves. It's rendered into the body according to a [`Kind`]:
///
/// - [`Content::Empty`] renders as an empty body.
/// - [`Content::Bytes`] is passed through.
/// - [`Content::Text`] is encoded as UTF-8, or as a JSON string for kinds
///   that render JSON.
/// - [`Content::Json`] is serialized compactly, preserving non-ASCII
///   characters. Strings are emitted verbatim for kinds that don't render
///   JSON, all other values as JSON.
///
/// [`Response`]: crate::http::Response
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Content {
    /// No content.
    #[default]
    Empty,
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Text.
    Text(String),
    /// JSON value.
    Json(Value),
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Content {
    /// Creates JSON content from a serializable value.
    ///
    /// JSON can't represent `NaN` or infinite numbers, which are rejected
    /// instead of being rendered as `null`.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::NonFinite`], if the value contains a `NaN`
    /// or infinite number, and [`Error::Json`] if it can't be converted, e.g.,
    /// for maps with non-string keys.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::http::response::Content;
    /// use std::collections::BTreeMap;
    ///
    /// // Create content from map
    /// let map = BTreeMap::from([("msg", "hi")]);
    /// let content = Content::json(&map)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn json<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        if !finite::is_finite(value) {
            return Err(Error::NonFinite);
        }

        // Convert value, which only fails for unrepresentable data
        serde_json::to_value(value)
            .map(Content::Json)
            .map_err(Into::into)
    }

    /// Renders the content according to the given kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::response::{Content, Kind};
    /// use serde_json::json;
    ///
    /// // Render JSON content
    /// let content = Content::from(json!({ "msg": "hi", "n": 1.5 }));
    /// assert_eq!(content.render(Kind::Json), br#"{"msg":"hi","n":1.5}"#);
    /// ```
    #[must_use]
    pub fn render(self, kind: Kind) -> Vec<u8> {
        match self {
            Content::Empty => Vec::new(),
            Content::Bytes(bytes) => bytes,
            Content::Text(text) if kind.is_json() => {
                Value::String(text).to_string().into_bytes()
            }
            Content::Text(text) => text.into_bytes(),
            Content::Json(Value::String(text)) if !kind.is_json() => {
                text.into_bytes()
            }
            Content::Json(value) => value.to_string().into_bytes(),
        }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl From<()> for Content {
    #[inline]
    fn from((): ()) -> Self {
        Content::Empty
    }
}

impl From<Vec<u8>> for Content {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<&[u8]> for Content {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        Content::Bytes(bytes.to_vec())
    }
}

impl From<String> for Content {
    #[inline]
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    #[inline]
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Value> for Content {
    #[inline]
    fn from(value: Value) -> Self {
        Content::Json(value)
    }
}

impl<T> From<Option<T>> for Content
where
    T: Into<Content>,
{
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Content::Empty, Into::into)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_render() {
        let test_cases: Vec<(Content, Kind, &[u8])> = vec![
            (Content::Empty, Kind::Json, b""),
            (Content::from(None::<String>), Kind::Plain, b""),
            (Content::from(&b"\x00\x01"[..]), Kind::Png, b"\x00\x01"),
            (Content::from("hi"), Kind::Plain, b"hi"),
            (Content::from("hi"), Kind::Json, b"\"hi\""),
            (Content::from(json!("hi")), Kind::Html, b"hi"),
            (Content::from(json!([1, null])), Kind::Plain, b"[1,null]"),
            (
                Content::from(json!({ "a": "ê" })),
                Kind::Json,
                "{\"a\":\"ê\"}".as_bytes(),
            ),
        ];
        for (content, kind, expected) in test_cases {
            assert_eq!(content.render(kind), expected);
        }
    }

    #[test]
    fn test_json() {
        let content = Content::json(&vec![1, 2]).unwrap();
        assert_eq!(content, Content::Json(json!([1, 2])));
        let content = Content::json(&BTreeMap::from([("n", 1.5)])).unwrap();
        assert_eq!(content.render(Kind::Json), br#"{"n":1.5}"#);
    }

    #[test]
    fn test_json_non_finite() {
        let res = Content::json(&f64::NAN);
        assert!(matches!(res, Err(Error::NonFinite)));
        let res = Content::json(&vec![1.0, f64::INFINITY]);
        assert!(matches!(res, Err(Error::NonFinite)));
        let res = Content::json(&BTreeMap::from([("a", [f32::NEG_INFINITY])]));
        assert!(matches!(res, Err(Error::NonFinite)));
    }
}
