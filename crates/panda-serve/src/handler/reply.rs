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

//! Handler reply.

use serde_json::Value;
use std::result;

use crate::http::response::Content;
use crate::http::Response;

use super::error::{BoxError, Error, Result};

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Handler reply.
///
/// Endpoints either return a fully built [`Response`], which is passed through
/// unchanged, or plain [`Content`], which is rendered using the kind of the
/// route that matched the request.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Response passed through unchanged.
    Response(Response),
    /// Content rendered by the route.
    Content(Content),
}

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Conversion into [`Reply`].
///
/// This trait is implemented for all types endpoints can return, including
/// results, whose errors are reported as [`Error::Endpoint`].
///
/// # Examples
///
/// ```
/// use panda_serve::handler::{IntoReply, Reply};
/// use panda_serve::http::response::Content;
///
/// // Convert string into reply
/// let reply = "Hello".into_reply();
/// assert!(matches!(reply, Ok(Reply::Content(Content::Text(_)))));
/// ```
pub trait IntoReply {
    /// Converts the value into a reply.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Endpoint`] for failed results.
    fn into_reply(self) -> Result<Reply>;
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl IntoReply for Reply {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(self)
    }
}

impl IntoReply for Response {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for Content {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Content(self))
    }
}

impl IntoReply for Value {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Content(Content::Json(self)))
    }
}

impl IntoReply for String {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Content(Content::Text(self)))
    }
}

impl IntoReply for &'static str {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Content(Content::from(self)))
    }
}

impl IntoReply for Vec<u8> {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Content(Content::Bytes(self)))
    }
}

impl IntoReply for () {
    #[inline]
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Content(Content::Empty))
    }
}

impl<T, E> IntoReply for result::Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Reply> {
        self.map_err(|err| Error::Endpoint(err.into()))
            .and_then(IntoReply::into_reply)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::http::Status;

    use super::*;

    #[test]
    fn test_into_reply() {
        let res = Response::from_status(Status::Accepted);
        let test_cases = vec![
            (res.clone().into_reply(), Reply::Response(res)),
            (json!([1]).into_reply(), Reply::Content(json!([1]).into())),
            ("a".into_reply(), Reply::Content("a".into())),
            (vec![1u8].into_reply(), Reply::Content(vec![1u8].into())),
            (().into_reply(), Reply::Content(Content::Empty)),
            (
                Ok::<_, BoxError>("b").into_reply(),
                Reply::Content("b".into()),
            ),
        ];
        for (reply, expected) in test_cases {
            assert_eq!(reply.unwrap(), expected);
        }
    }

    #[test]
    fn test_into_reply_error() {
        let reply = Err::<(), _>("invalid input").into_reply();
        assert!(
            matches!(reply, Err(Error::Endpoint(err)) if err.to_string() == "invalid input")
        );
    }
}
