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

//! HTTP headers.

use std::fmt;
use std::slice::Iter;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP headers.
///
/// Header maps are shared by requests, responses and the per-request context.
/// Names are normalized to lowercase on insertion and lookup, so a header set
/// as `Content-Type` is found as `content-type` or `CONTENT-TYPE` as well.
/// Entries keep their insertion order, and inserting a name that is already
/// present replaces its value in place, which ensures that a header is never
/// emitted twice.
///
/// Keys can be given as a [`Header`][] or as any string.
///
/// [`Header`]: crate::http::Header
///
/// # Examples
///
/// ```
/// use panda_serve::http::{Header, Headers};
///
/// // Create header map and add header
/// let mut headers = Headers::new();
/// headers.insert(Header::ContentType, "text/plain");
///
/// // Obtain header value, regardless of case
/// assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    /// Ordered list of headers.
    inner: Vec<(String, String)>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Headers {
    /// Creates a header map.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::Headers;
    ///
    /// // Create header map
    /// let headers = Headers::new();
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Returns the value for the given header.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Headers};
    ///
    /// // Create header map and add header
    /// let mut headers = Headers::new();
    /// headers.insert("X-Request-Id", "42");
    ///
    /// // Obtain reference to header value
    /// assert_eq!(headers.get("x-request-id"), Some("42"));
    /// assert_eq!(headers.get(Header::ContentType), None);
    /// ```
    #[must_use]
    pub fn get<K>(&self, key: K) -> Option<&str>
    where
        K: AsRef<str>,
    {
        self.position(key.as_ref())
            .map(|index| self.inner[index].1.as_str())
    }

    /// Returns whether the header is contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Headers};
    ///
    /// // Create header map and add header
    /// let mut headers = Headers::new();
    /// headers.insert(Header::ContentType, "text/plain");
    ///
    /// // Ensure presence of header
    /// assert!(headers.contains("content-type"));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains<K>(&self, key: K) -> bool
    where
        K: AsRef<str>,
    {
        self.position(key.as_ref()).is_some()
    }

    /// Inserts a header, replacing the value of an existing one.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Headers};
    ///
    /// // Create header map and add header twice
    /// let mut headers = Headers::new();
    /// headers.insert(Header::ContentLength, 12);
    /// headers.insert("content-length", 24);
    ///
    /// // Ensure header is only present once
    /// assert_eq!(headers.len(), 1);
    /// assert_eq!(headers.get(Header::ContentLength), Some("24"));
    /// ```
    #[allow(clippy::needless_pass_by_value)]
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<str>,
        V: ToString,
    {
        let value = value.to_string();
        match self.position(key.as_ref()) {
            Some(index) => self.inner[index].1 = value,
            None => self.inner.push((key.as_ref().to_lowercase(), value)),
        }
    }

    /// Inserts a header, unless it's already present.
    ///
    /// Returns whether the header was inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Headers};
    ///
    /// // Create header map and add header
    /// let mut headers = Headers::new();
    /// headers.insert(Header::ContentType, "text/html");
    ///
    /// // Ensure existing header is retained
    /// assert!(!headers.insert_default(Header::ContentType, "text/plain"));
    /// assert_eq!(headers.get(Header::ContentType), Some("text/html"));
    /// ```
    pub fn insert_default<K, V>(&mut self, key: K, value: V) -> bool
    where
        K: AsRef<str>,
        V: ToString,
    {
        let absent = !self.contains(key.as_ref());
        if absent {
            self.insert(key, value);
        }
        absent
    }

    /// Removes a header and returns its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::{Header, Headers};
    ///
    /// // Create header map and add header
    /// let mut headers = Headers::new();
    /// headers.insert(Header::Cookie, "id=1");
    ///
    /// // Remove header
    /// assert_eq!(headers.remove("cookie").as_deref(), Some("id=1"));
    /// assert!(headers.is_empty());
    /// ```
    pub fn remove<K>(&mut self, key: K) -> Option<String>
    where
        K: AsRef<str>,
    {
        self.position(key.as_ref())
            .map(|index| self.inner.remove(index).1)
    }

    /// Merges the given headers, replacing existing values.
    pub fn extend(&mut self, headers: &Headers) {
        for (key, value) in headers {
            self.insert(key, value);
        }
    }

    /// Returns the index of the header with the given name.
    fn position(&self, key: &str) -> Option<usize> {
        self.inner
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(key))
    }
}

#[allow(clippy::must_use_candidate)]
impl Headers {
    /// Returns the number of headers.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether there are any headers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: ToString,
{
    /// Creates a header map from an iterator.
    ///
    /// Later duplicates replace the values of earlier ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::Headers;
    ///
    /// // Create header map from iterator
    /// let headers = Headers::from_iter([
    ///     ("Accept", "text/html"),
    ///     ("accept", "application/json"),
    /// ]);
    /// assert_eq!(headers.get("Accept"), Some("application/json"));
    /// ```
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut headers = Headers::new();
        for (key, value) in iter {
            headers.insert(key, value);
        }
        headers
    }
}

// ----------------------------------------------------------------------------

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = HeadersIter<'a>;

    /// Creates an iterator over the headers.
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        HeadersIter { inner: self.inner.iter() }
    }
}

// ----------------------------------------------------------------------------

impl fmt::Display for Headers {
    /// Formats the headers for display.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (key, value) in self {
            write!(f, "{key}: {value}\r\n")?;
        }

        // No errors occurred
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Iterators
// ----------------------------------------------------------------------------

/// Iterator over headers.
pub struct HeadersIter<'a> {
    /// Inner iterator.
    inner: Iter<'a, (String, String)>,
}

impl<'a> Iterator for HeadersIter<'a> {
    type Item = (&'a str, &'a str);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::http::Header;

    use super::*;

    #[test]
    fn test_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        for key in ["Content-Type", "content-type", "CONTENT-TYPE"] {
            assert_eq!(headers.get(key), Some("application/json"));
        }
        assert_eq!(headers.get(Header::ContentType), Some("application/json"));
    }

    #[test]
    fn test_insertion_order() {
        let mut headers = Headers::new();
        headers.insert("b", 1);
        headers.insert("A", 2);
        headers.insert("B", 3);
        let entries: Vec<_> = headers.into_iter().collect();
        assert_eq!(entries, vec![("b", "3"), ("a", "2")]);
    }

    #[test]
    fn test_display() {
        let headers = Headers::from_iter([("Vary", "Accept-Encoding")]);
        assert_eq!(headers.to_string(), "vary: Accept-Encoding\r\n");
    }
}
