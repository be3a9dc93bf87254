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

//! HTTP query string.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

use super::encoding::{decode, encode};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP query string.
///
/// Query strings are ordered maps from strings to strings. When parsing with
/// [`Query::from`], keys and values are percent-decoded, and a `+` decodes to
/// a space. If a key appears more than once, the later value replaces the
/// earlier one, but the key keeps the position of its first appearance.
/// Lookups and insertions take constant time, as parameters are indexed by
/// key, which matters for large form bodies.
///
/// The same representation is used for decoded form bodies, which follow the
/// exact same encoding rules.
///
/// # Examples
///
/// ```
/// use panda_serve::http::request::Query;
///
/// // Create query string from string
/// let query = Query::from("q=rust+http&page=2&page=3");
/// assert_eq!(query.get("q"), Some("rust http"));
/// assert_eq!(query.get("page"), Some("3"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    /// List of parameters.
    inner: Vec<(String, String)>,
    /// Positions of parameters in the list by key.
    index: HashMap<String, usize>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Query {
    /// Creates a query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Query;
    ///
    /// // Create query string
    /// let query = Query::new();
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parameter value for the given key.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Query;
    ///
    /// // Create query string and add parameter
    /// let mut query = Query::new();
    /// query.insert("key", "value");
    ///
    /// // Obtain reference to parameter value
    /// assert_eq!(query.get("key"), Some("value"));
    /// ```
    pub fn get<K>(&self, key: K) -> Option<&str>
    where
        K: AsRef<str>,
    {
        let index = self.index.get(key.as_ref())?;
        self.inner.get(*index).map(|(_, value)| value.as_str())
    }

    /// Returns whether the parameter is contained.
    pub fn contains<K>(&self, key: K) -> bool
    where
        K: AsRef<str>,
    {
        self.index.contains_key(key.as_ref())
    }

    /// Inserts a parameter, replacing the value of an existing one.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Query;
    ///
    /// // Create query string and add parameter twice
    /// let mut query = Query::new();
    /// query.insert("key", "a");
    /// query.insert("key", "b");
    ///
    /// // Ensure parameter is only present once
    /// assert_eq!(query.len(), 1);
    /// assert_eq!(query.get("key"), Some("b"));
    /// ```
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&index) => self.inner[index].1 = value,
            None => {
                self.index.insert(key.clone(), self.inner.len());
                self.inner.push((key, value));
            }
        }
    }

    /// Removes the given parameter and returns its value.
    pub fn remove<K>(&mut self, key: K) -> Option<String>
    where
        K: AsRef<str>,
    {
        let index = self.index.remove(key.as_ref())?;
        let (_, value) = self.inner.remove(index);

        // Shift positions of all subsequent parameters
        for position in self.index.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(value)
    }

    /// Returns an iterator over all parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

#[allow(clippy::must_use_candidate)]
impl Query {
    /// Returns the number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether there are any parameters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl From<&str> for Query {
    /// Creates a query string from a string.
    ///
    /// The string is expected to be a sequence of key-value pairs connected
    /// with `&`, without the leading `?`. Pairs are split at the first `=`,
    /// so a key without `=` maps to an empty value. Empty pairs are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Query;
    ///
    /// // Create query string from string
    /// let query = Query::from("flag&limit=25&expr=a=b");
    /// assert_eq!(query.get("flag"), Some(""));
    /// assert_eq!(query.get("expr"), Some("a=b"));
    /// ```
    fn from(value: &str) -> Self {
        let iter = value.split('&').filter(|pair| !pair.is_empty());
        Query::from_iter(iter.map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key).into_owned(), decode(value).into_owned())
        }))
    }
}

// ----------------------------------------------------------------------------

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    /// Creates a query string from an iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Query;
    ///
    /// // Create query string from iterator
    /// let query = Query::from_iter([
    ///     ("query", "search"),
    ///     ("limit", "25"),
    /// ]);
    /// ```
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut query = Query::new();
        for (key, value) in iter {
            query.insert(key, value);
        }
        query
    }
}

// ----------------------------------------------------------------------------

impl Serialize for Query {
    /// Serializes the query string as a map.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ----------------------------------------------------------------------------

impl fmt::Display for Query {
    /// Formats the query string for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }

            // Write parameter key and value, if any
            f.write_str(encode(key).as_ref())?;
            if !value.is_empty() {
                f.write_str("=")?;
                f.write_str(encode(value).as_ref())?;
            }
        }

        // No errors occurred
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn test_from() {
        let test_cases = vec![
            ("", vec![]),
            ("a=1", vec![("a", "1")]),
            ("a=1&b", vec![("a", "1"), ("b", "")]),
            ("a=1&&b=2", vec![("a", "1"), ("b", "2")]),
            ("a=1&b=2&a=3", vec![("a", "3"), ("b", "2")]),
            ("name=J%C3%B6rg+M", vec![("name", "Jörg M")]),
            ("k%26=v%3D", vec![("k&", "v=")]),
        ];
        for (value, expected) in test_cases {
            let query = Query::from(value);
            assert_eq!(query.iter().collect::<Vec<_>>(), expected, "{value}");
        }
    }

    #[test]
    fn test_remove() {
        let mut query = Query::from("a=1&b=2&c=3");
        assert_eq!(query.remove("a"), Some(String::from("1")));
        assert_eq!(query.remove("a"), None);
        query.insert("b", "4");
        query.insert("d", "5");
        assert_eq!(query.get("c"), Some("3"));
        assert_eq!(
            query.iter().collect::<Vec<_>>(),
            [("b", "4"), ("c", "3"), ("d", "5")]
        );
    }

    #[test]
    fn test_from_many_keys() {
        let keys = (0..100_000).map(|n| format!("k{n}")).collect::<Vec<_>>();
        let value = keys.join("&");

        let start = Instant::now();
        let query = Query::from(value.as_str());
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(query.len(), 100_000);
        assert_eq!(query.get("k99999"), Some(""));
    }

    #[test]
    fn test_display() {
        let query = Query::from("q=a+b&flag");
        assert_eq!(query.to_string(), "q=a%20b&flag");
    }

    #[test]
    fn test_serialize() {
        let query = Query::from("b=2&a=1");
        let value = serde_json::to_string(&query).unwrap();
        assert_eq!(value, r#"{"b":"2","a":"1"}"#);
    }
}
