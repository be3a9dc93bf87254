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

//! HTTP request cookies.

use std::collections::btree_map::Iter;
use std::collections::BTreeMap;

use super::uri::encoding::decode;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP request cookies.
///
/// Cookies are extracted from the `Cookie` header while parsing a request,
/// and the header is removed from the request's header map afterwards. The
/// header is split on `;`, and each pair at its first `=`. Values are
/// percent-decoded, while names are taken verbatim after trimming.
///
/// # Examples
///
/// ```
/// use panda_serve::http::request::Cookies;
///
/// // Create cookies from header value
/// let cookies = Cookies::from("session=a%20b; theme=dark");
/// assert_eq!(cookies.get("session"), Some("a b"));
/// assert_eq!(cookies.get("theme"), Some("dark"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cookies {
    /// Map of cookies.
    inner: BTreeMap<String, String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Cookies {
    /// Creates a cookie map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the given cookie.
    pub fn get<K>(&self, name: K) -> Option<&str>
    where
        K: AsRef<str>,
    {
        self.inner.get(name.as_ref()).map(String::as_str)
    }

    /// Inserts a cookie, replacing the value of an existing one.
    pub fn insert<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.insert(name.into(), value.into());
    }

    /// Returns an iterator over all cookies.
    #[inline]
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.inner.iter()
    }
}

#[allow(clippy::must_use_candidate)]
impl Cookies {
    /// Returns the number of cookies.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether there are any cookies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl From<&str> for Cookies {
    /// Creates a cookie map from a `Cookie` header value.
    ///
    /// Pairs without a `=` are skipped, as they carry no name.
    fn from(value: &str) -> Self {
        let mut cookies = Cookies::new();
        for pair in value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies.insert(name.trim(), decode(value.trim()));
            }
        }
        cookies
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from() {
        let test_cases = vec![
            ("", vec![]),
            ("a=1", vec![("a", "1")]),
            ("a=1;b=2", vec![("a", "1"), ("b", "2")]),
            (" a = 1 ;; b", vec![("a", "1")]),
            ("token=x=y", vec![("token", "x=y")]),
            ("name=J%C3%B6rg", vec![("name", "Jörg")]),
        ];
        for (value, expected) in test_cases {
            let cookies = Cookies::from(value);
            let actual: Vec<_> = cookies
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            assert_eq!(actual, expected, "{value}");
        }
    }
}
