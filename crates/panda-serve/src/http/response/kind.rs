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

//! HTTP response kind.

use std::path::Path;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP response kind.
///
/// Kinds determine the media type of a response, and how [`Content`][] is
/// rendered into the body. They're selected when a route is registered, and
/// only come into play when an endpoint returns plain content instead of a
/// [`Response`][].
///
/// [`Content`]: crate::http::response::Content
/// [`Response`]: crate::http::Response
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Kind {
    /// No media type.
    Raw,
    /// Plain text.
    Plain,
    /// HTML document.
    Html,
    /// CSS stylesheet.
    Css,
    /// JavaScript.
    Js,
    /// JSON document.
    #[default]
    Json,
    /// Web application manifest.
    Manifest,
    /// PDF document.
    Pdf,
    /// Arbitrary binary data.
    Binary,
    /// JPEG image.
    Jpeg,
    /// PNG image.
    Png,
    /// Icon.
    Ico,
    /// SVG image.
    Svg,
    /// GIF image.
    Gif,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Kind {
    /// Returns the media type.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::response::Kind;
    ///
    /// // Obtain media type
    /// assert_eq!(Kind::Json.media_type(), Some("application/json"));
    /// assert_eq!(Kind::Raw.media_type(), None);
    /// ```
    #[must_use]
    pub const fn media_type(&self) -> Option<&'static str> {
        match self {
            Kind::Raw => None,
            Kind::Plain => Some("text/plain"),
            Kind::Html => Some("text/html"),
            Kind::Css => Some("text/css"),
            Kind::Js => Some("text/javascript"),
            Kind::Json => Some("application/json"),
            Kind::Manifest => Some("application/manifest+json"),
            Kind::Pdf => Some("application/pdf"),
            Kind::Binary => Some("application/octet-stream"),
            Kind::Jpeg => Some("image/jpeg"),
            Kind::Png => Some("image/png"),
            Kind::Ico => Some("image/vnd.microsoft.icon"),
            Kind::Svg => Some("image/svg+xml"),
            Kind::Gif => Some("image/gif"),
        }
    }

    /// Returns whether content is rendered as JSON.
    #[inline]
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self, Kind::Json | Kind::Manifest)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Guesses the media type of a file from its extension.
///
/// Falls back to `application/octet-stream` for unknown extensions.
///
/// # Examples
///
/// ```
/// use panda_serve::http::response::guess_media_type;
///
/// // Guess media types from paths
/// assert_eq!(guess_media_type("config.yml"), "application/x-yaml");
/// assert_eq!(guess_media_type("IMAGE.PNG"), "image/png");
/// assert_eq!(guess_media_type("blob"), "application/octet-stream");
/// ```
#[must_use]
pub fn guess_media_type<P>(path: P) -> &'static str
where
    P: AsRef<Path>,
{
    let extension = path.as_ref().extension().and_then(|ext| ext.to_str());
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("js" | "mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("map") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/vnd.microsoft.icon",
        Some("bmp") => "image/bmp",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",
        Some("yaml" | "yml") => "application/x-yaml",
        Some("wasm") => "application/wasm",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        _ => "application/octet-stream",
    }
}
