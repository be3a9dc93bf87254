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

//! HTTP header.

use std::fmt;

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl AsRef<str> for Header {
    /// Returns the string representation.
    #[inline]
    fn as_ref(&self) -> &str {
        self.name()
    }
}

// ----------------------------------------------------------------------------

impl fmt::Display for Header {
    /// Formats the header for display.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ----------------------------------------------------------------------------
// Macros
// ----------------------------------------------------------------------------

/// Defines and implements HTTP headers.
macro_rules! define_and_impl_header {
    (
        $(
            // Header group
            $(#[$_:meta])*
            $group:ident:
            {
                $(
                    // Header definition
                    $(#[$comment:meta])*
                    $name:ident = $header:expr
                ),+
                $(,)?
            }
        )+
    ) => {
        /// HTTP header.
        ///
        /// This enum names the headers the engine itself reads or writes, so
        /// they can be passed to [`Headers`][] without spelling them out. Any
        /// other header can be used by name, as [`Headers`][] accepts every
        /// string-like key and compares names case-insensitively.
        ///
        /// [`Headers`]: crate::http::Headers
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
        pub enum Header {
            $(
                $(
                    $(#[$comment])*
                    $name,
                )+
            )+
        }

        impl Header {
            /// Returns the header name.
            ///
            /// # Examples
            ///
            /// ```
            /// use panda_serve::http::Header;
            ///
            /// // Create header
            /// let header = Header::ContentType;
            ///
            /// // Obtain header name
            /// assert_eq!(header.name(), "Content-Type");
            /// ```
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self {
                    $(
                        $(
                            Header::$name => $header,
                        )+
                    )+
                }
            }
        }
    };
}

// ----------------------------------------------------------------------------

define_and_impl_header! {

    /// General headers
    General: {
        /// Cache-Control header
        CacheControl = "Cache-Control",
        /// Connection header
        Connection = "Connection",
        /// Date header
        Date = "Date",
    }

    /// Request headers
    Request: {
        /// Accept header
        Accept = "Accept",
        /// Accept-Encoding header
        AcceptEncoding = "Accept-Encoding",
        /// CF-Connecting-IP header
        CfConnectingIp = "CF-Connecting-IP",
        /// Cookie header
        Cookie = "Cookie",
        /// Host header
        Host = "Host",
        /// If-Modified-Since header
        IfModifiedSince = "If-Modified-Since",
        /// User-Agent header
        UserAgent = "User-Agent",
    }

    /// Response headers
    Response: {
        /// Location header
        Location = "Location",
        /// Server header
        Server = "Server",
        /// Set-Cookie header
        SetCookie = "Set-Cookie",
        /// Vary header
        Vary = "Vary",
    }

    /// Entity headers
    Entity: {
        /// Content-Encoding header
        ContentEncoding = "Content-Encoding",
        /// Content-Length header
        ContentLength = "Content-Length",
        /// Content-Type header
        ContentType = "Content-Type",
        /// Last-Modified header
        LastModified = "Last-Modified",
    }
}
