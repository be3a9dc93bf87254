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

//! Encoding.

use percent_encoding::{AsciiSet, percent_decode_str, utf8_percent_encode};
use std::borrow::Cow;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Character set to be percent-encoded.
#[rustfmt::skip]
const SET: &AsciiSet = &percent_encoding::CONTROLS
    .add(b' ').add(b'"').add(b'#').add(b'%').add(b'<').add(b'>').add(b'[')
    .add(b']').add(b'^').add(b'`').add(b'{').add(b'|').add(b'}').add(b'=')
    .add(b'&').add(b'+').add(b'?');

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Encodes a string used in a query string.
#[inline]
#[must_use]
pub fn encode(value: &str) -> Cow<'_, str> {
    utf8_percent_encode(value, SET).into()
}

/// Decodes a string used in a query string, cookie or form body.
///
/// A `+` decodes to a space. Malformed or incomplete percent sequences, like
/// a trailing `%`, are passed through verbatim, and invalid UTF-8 sequences
/// are replaced with the replacement character.
#[inline]
#[must_use]
pub fn decode(value: &str) -> Cow<'_, str> {
    if value.contains('+') {
        percent_decode_str(&value.replace('+', " "))
            .decode_utf8_lossy()
            .into_owned()
            .into()
    } else {
        percent_decode_str(value).decode_utf8_lossy()
    }
}

/// Decodes a request path.
///
/// Unlike [`decode`], a `+` is kept as is, as it carries no special meaning
/// in the path component of a URI.
#[inline]
#[must_use]
pub fn decode_path(value: &str) -> Cow<'_, str> {
    percent_decode_str(value).decode_utf8_lossy()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let test_cases = vec![
            ("caf%C3%A9", "café"),
            ("%C3%AA", "ê"),
            ("a+b", "a b"),
            ("100%", "100%"),
            ("%2", "%2"),
            ("%zz", "%zz"),
            ("plain", "plain"),
        ];
        for (value, expected) in test_cases {
            assert_eq!(decode(value), expected, "{value}");
        }
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/a+b/%C3%AA"), "/a+b/ê");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(decode(&encode("1 + 1 = 2")), "1 + 1 = 2");
    }
}
