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

//! HTTP request URI.

use std::fmt;

pub(crate) mod encoding;
mod query;

use encoding::{decode_path, encode};
pub use query::Query;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP request URI.
///
/// This is a lightweight URI parser for origin-form request targets. The raw
/// target is split into path and query string at the first `?`, and a
/// `#fragment`, which clients should never send, is dropped if present. The
/// path is stored percent-decoded, and the query string is decoded into an
/// ordered [`Query`] map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Uri {
    /// Request path.
    pub path: String,
    /// Query string.
    pub query: Query,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Uri {
    /// Creates a request URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Uri;
    ///
    /// // Create request URI
    /// let uri = Uri::new();
    /// assert_eq!(uri.path, "/");
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl From<&str> for Uri {
    /// Creates a request URI from a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Uri;
    ///
    /// // Create request URI from string
    /// let uri = Uri::from("/caf%C3%A9?key=value#top");
    /// assert_eq!(uri.path, "/café");
    /// assert_eq!(uri.query.get("key"), Some("value"));
    /// ```
    fn from(value: &str) -> Self {
        let value = value.split_once('#').map_or(value, |(head, _)| head);
        match value.split_once('?') {
            Some((path, query)) => Uri {
                path: decode_path(path).into_owned(),
                query: Query::from(query),
            },
            None => Uri {
                path: decode_path(value).into_owned(),
                query: Query::default(),
            },
        }
    }
}

// ----------------------------------------------------------------------------

impl Default for Uri {
    /// Creates a default request URI.
    #[inline]
    fn default() -> Self {
        Uri {
            path: String::from("/"),
            query: Query::default(),
        }
    }
}

// ----------------------------------------------------------------------------

impl fmt::Display for Uri {
    /// Formats the request URI for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(encode(&self.path).as_ref())?;

        // Write query string, if any
        if !self.query.is_empty() {
            f.write_str("?")?;
            self.query.fmt(f)?;
        }

        // No errors occurred
        Ok(())
    }
}
