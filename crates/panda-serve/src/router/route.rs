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

//! Route.

use crate::handler::{self, Context, Endpoint};
use crate::http::response::Kind;
use crate::http::{Method, Response};

use super::error::{Error, Result};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Route.
///
/// A route matches requests by exact path and method, and renders the content
/// returned by its endpoint with its kind, which defaults to [`Kind::Json`].
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::handler::Endpoint;
/// use panda_serve::http::response::Kind;
/// use panda_serve::http::Method;
/// use panda_serve::router::Route;
///
/// // Create route
/// let route = Route::new(Method::Get, "/", Endpoint::sync(|_| "<h1>Hi</h1>"))?
///     .kind(Kind::Html);
/// assert!(route.matches("/", Method::Get));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Route {
    /// Route method.
    method: Method,
    /// Route path.
    path: String,
    /// Route endpoint.
    endpoint: Endpoint,
    /// Route kind.
    kind: Kind,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Route {
    /// Creates a route.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Path`], if the path doesn't start with a
    /// slash.
    pub fn new<P>(method: Method, path: P, endpoint: Endpoint) -> Result<Self>
    where
        P: Into<String>,
    {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(Error::Path(path));
        }

        // Return route
        Ok(Self {
            method,
            path,
            endpoint,
            kind: Kind::default(),
        })
    }

    /// Sets the kind used to render content.
    #[inline]
    #[must_use]
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns whether the route matches the given path and method.
    #[inline]
    #[must_use]
    pub fn matches(&self, path: &str, method: Method) -> bool {
        self.method == method && self.path == path
    }

    /// Handles the request described by the given context.
    ///
    /// # Errors
    ///
    /// This method returns the errors of [`Endpoint::respond`].
    pub async fn handle(&self, ctx: Context) -> handler::Result<Response> {
        self.endpoint.respond(ctx, self.kind).await
    }

    /// Prepends the given prefix to the path.
    pub(super) fn prepend(&mut self, prefix: &str) {
        if prefix != "/" {
            self.path.insert_str(0, prefix);
        }
    }
}

#[allow(clippy::must_use_candidate)]
impl Route {
    /// Returns the route method.
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the route path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the route endpoint.
    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let endpoint = Endpoint::default();
        assert!(Route::new(Method::Get, "/a", endpoint.clone()).is_ok());
        assert!(matches!(
            Route::new(Method::Get, "a", endpoint),
            Err(Error::Path(path)) if path == "a"
        ));
    }

    #[test]
    fn test_matches() {
        let route = Route::new(Method::Post, "/echo", Endpoint::default());
        let route = route.unwrap();
        let test_cases = vec![
            ("/echo", Method::Post, true),
            ("/echo", Method::Get, false),
            ("/echo/", Method::Post, false),
            ("/ech", Method::Post, false),
        ];
        for (path, method, expected) in test_cases {
            assert_eq!(route.matches(path, method), expected);
        }
    }
}
