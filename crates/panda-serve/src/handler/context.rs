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

//! Handler context.

use std::sync::Arc;

use crate::http::{Headers, Request};
use crate::pool::Pool;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Handler context.
///
/// A context is created for every request and threaded through the pre hooks
/// of all middlewares and into the matched endpoint. It carries the parsed
/// request, which is read-only, and two mutable maps:
///
/// - `values`: request metadata written by middlewares, e.g., the method,
///   path and protocol recorded by [`RequestInfo`][]. Values are never sent.
/// - `headers`: response headers, which are seeded into every response that
///   is built from the content an endpoint returns.
///
/// Both maps compare keys case-insensitively. Cloning a context is cheap
/// except for the maps, as the request and worker pool are shared.
///
/// [`RequestInfo`]: crate::middleware::RequestInfo
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::handler::Context;
/// use panda_serve::http::Request;
/// use panda_serve::pool::Pool;
///
/// // Create context
/// let mut ctx = Context::new(Request::new().uri("/a"), Pool::new(1)?);
/// assert_eq!(ctx.path(), "/a");
///
/// // Override path recorded in context
/// ctx.values.insert("Path", "/b");
/// assert_eq!(ctx.path(), "/b");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Context {
    /// Parsed request.
    pub request: Arc<Request>,
    /// Request metadata.
    pub values: Headers,
    /// Response headers.
    pub headers: Headers,
    /// Worker pool.
    pool: Pool,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Context {
    /// Creates a context for the given request.
    #[must_use]
    pub fn new(request: Request, pool: Pool) -> Self {
        Self {
            request: Arc::new(request),
            values: Headers::new(),
            headers: Headers::new(),
            pool,
        }
    }

    /// Returns the request path.
    ///
    /// The path recorded in the request metadata takes precedence over the
    /// path of the request, so middlewares can rewrite it before routing.
    #[must_use]
    pub fn path(&self) -> &str {
        self.values
            .get("path")
            .unwrap_or(self.request.uri.path.as_str())
    }

    /// Returns the worker pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}
