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

//! Compression middleware.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};
use tracing::warn;

use crate::handler::Context;
use crate::http::{Header, Response};

use super::Middleware;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Media types worth compressing, matched as prefixes.
const COMPRESSIBLE: &[&str] = &[
    // Text
    "text/html",
    "text/css",
    "text/plain",
    "text/xml",
    "text/markdown",
    "text/cache-manifest",
    "text/vcard",
    "text/vnd.rim.location.xloc",
    "text/vtt",
    "text/x-component",
    "text/x-cross-domain-policy",
    "text/javascript",
    "text/yaml",
    "text/x-yaml",
    // Scripts and JSON
    "application/javascript",
    "application/json",
    "application/x-javascript",
    "application/ld+json",
    "application/manifest+json",
    "application/schema+json",
    "application/vnd.geo+json",
    "application/x-web-app-manifest+json",
    // XML
    "application/xml",
    "application/atom+xml",
    "application/rss+xml",
    "application/xhtml+xml",
    "application/soap+xml",
    "application/rdf+xml",
    "application/vnd.mozilla.xul+xml",
    "application/wsdl+xml",
    // YAML
    "application/yaml",
    "application/x-yaml",
    // Fonts
    "application/vnd.ms-fontobject",
    "application/x-font-ttf",
    "application/x-font-opentype",
    "application/x-font-truetype",
    "font/eot",
    "font/opentype",
    "font/otf",
    "font/ttf",
    // Uncompressed images
    "image/svg+xml",
    "image/x-icon",
    "image/bmp",
];

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Compression middleware.
///
/// Compresses response bodies with gzip, if the client accepts it, the body is
/// at least as large as the minimum size, the media type is compressible, and
/// the response isn't encoded yet. The compressed body is only used if it's
/// actually smaller than the original body. Compression runs on the worker
/// pool, so large bodies don't hold up other connections.
///
/// # Examples
///
/// ```
/// use panda_serve::middleware::{Compress, Pipeline};
///
/// // Create pipeline with compression
/// let pipeline = Pipeline::new()
///     .with(Compress::default().min_size(1024).level(9));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Compress {
    /// Minimum body size in bytes.
    min_size: usize,
    /// Compression level.
    level: u32,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Compress {
    /// Sets the minimum body size, defaulting to 500 bytes.
    #[inline]
    #[must_use]
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Sets the compression level between 1 and 9, defaulting to 6.
    #[inline]
    #[must_use]
    pub fn level(mut self, level: u32) -> Self {
        self.level = level.clamp(1, 9);
        self
    }

    /// Returns whether the response should be compressed for the request.
    fn applies(&self, ctx: &Context, res: &Response) -> bool {
        let accept = ctx.request.headers.get(Header::AcceptEncoding);
        accept.is_some_and(accepts_gzip) && self.qualifies(res)
    }

    /// Returns whether the response qualifies for compression.
    fn qualifies(&self, res: &Response) -> bool {
        if res.headers.contains(Header::ContentEncoding) {
            return false;
        }
        if res.body.is_empty() || res.body.len() < self.min_size {
            return false;
        }

        // Check media type against allow-list
        res.headers
            .get(Header::ContentType)
            .is_some_and(is_compressible)
    }

    /// Compresses the given bytes.
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let capacity = bytes.len() / 2;
        let level = Compression::new(self.level);
        let mut encoder = GzEncoder::new(Vec::with_capacity(capacity), level);
        encoder.write_all(bytes)?;
        encoder.finish()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for Compress {
    fn post(&self, ctx: &Context, res: Response) -> Response {
        if !self.applies(ctx, &res) {
            return res;
        }

        // Compress body, and keep the original if compression doesn't pay off
        let body = match self.compress(&res.body) {
            Ok(body) if body.len() < res.body.len() => body,
            Ok(_) => return res,
            Err(err) => {
                warn!(%err, "compression failed");
                return res;
            }
        };

        // Return compressed response
        res.header(Header::ContentLength, body.len())
            .header(Header::ContentEncoding, "gzip")
            .header(Header::Vary, "Accept-Encoding")
            .body(body)
    }

    #[inline]
    fn is_blocking(&self, ctx: &Context, res: &Response) -> bool {
        self.applies(ctx, res)
    }
}

impl Default for Compress {
    /// Creates a compression middleware.
    #[inline]
    fn default() -> Self {
        Self { min_size: 500, level: 6 }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns whether the given `Accept-Encoding` value accepts gzip.
///
/// Encodings with a quality of zero are explicitly refused. A wildcard covers
/// gzip, unless gzip is listed itself, in which case its own quality wins.
fn accepts_gzip(value: &str) -> bool {
    let mut wildcard = false;
    for item in value.split(',') {
        let mut parts = item.split(';').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let accepted = !parts.any(|param| {
            param
                .strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        if name.eq_ignore_ascii_case("gzip") {
            return accepted;
        }
        if name == "*" {
            wildcard = accepted;
        }
    }
    wildcard
}

/// Returns whether the given media type is compressible.
fn is_compressible(media_type: &str) -> bool {
    let media_type = media_type.to_ascii_lowercase();
    COMPRESSIBLE
        .iter()
        .any(|prefix| media_type.starts_with(prefix))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use flate2::read::GzDecoder;
    use std::io::Read;

    use crate::http::response::Kind;
    use crate::http::Request;
    use crate::pool::Pool;

    use super::*;

    fn context(accept: &str) -> Context {
        let req = Request::new().header(Header::AcceptEncoding, accept);
        Context::new(req, Pool::new(1).unwrap())
    }

    fn response(kind: Kind, size: usize) -> Response {
        Response::builder(kind).content("a".repeat(size))
    }

    #[test]
    fn test_post() {
        let ctx = context("gzip, deflate");
        let res = Compress::default().post(&ctx, response(Kind::Plain, 600));
        assert_eq!(res.headers.get(Header::ContentEncoding), Some("gzip"));
        assert_eq!(res.headers.get(Header::Vary), Some("Accept-Encoding"));
        let length = res.body.len().to_string();
        assert_eq!(res.headers.get(Header::ContentLength), Some(&*length));

        // Decompress body
        let mut body = String::new();
        let mut decoder = GzDecoder::new(res.body.as_slice());
        decoder.read_to_string(&mut body).unwrap();
        assert_eq!(body, "a".repeat(600));
    }

    #[test]
    fn test_post_skipped() {
        let compress = Compress::default();
        let test_cases = vec![
            (context("gzip"), response(Kind::Plain, 499)),
            (context("gzip"), response(Kind::Png, 600)),
            (context("gzip"), response(Kind::Raw, 600)),
            (context("gzip;q=0"), response(Kind::Plain, 600)),
            (context("br"), response(Kind::Plain, 600)),
            (
                context("gzip"),
                response(Kind::Plain, 600).header(Header::ContentEncoding, "br"),
            ),
        ];
        for (ctx, res) in test_cases {
            let expected = res.clone();
            assert_eq!(compress.post(&ctx, res), expected);
        }
    }

    #[test]
    fn test_post_idempotent() {
        let ctx = context("gzip");
        let compress = Compress::default();
        let res = compress.post(&ctx, response(Kind::Json, 600));
        assert_eq!(compress.post(&ctx, res.clone()), res);
    }

    #[test]
    fn test_is_blocking() {
        let compress = Compress::default();
        let res = response(Kind::Plain, 600);
        assert!(compress.is_blocking(&context("gzip"), &res));
        assert!(!compress.is_blocking(&context("br"), &res));
        let res = response(Kind::Plain, 10);
        assert!(!compress.is_blocking(&context("gzip"), &res));
    }

    #[test]
    fn test_post_incompressible() {
        let res = response(Kind::Plain, 8);
        let compress = Compress::default().min_size(1);
        assert_eq!(compress.post(&context("gzip"), res.clone()), res);
    }

    #[test]
    fn test_accepts_gzip() {
        let test_cases = vec![
            ("gzip", true),
            ("deflate, GZIP", true),
            ("gzip;q=0.5", true),
            ("gzip; q=0", false),
            ("x-gzip", false),
            ("*", true),
            ("br, *;q=0.1", true),
            ("*;q=0", false),
            ("gzip;q=0, *", false),
            ("", false),
        ];
        for (value, expected) in test_cases {
            assert_eq!(accepts_gzip(value), expected, "{value}");
        }
    }
}
