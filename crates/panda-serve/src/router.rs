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

//! Router.

use tracing::{debug, info};

use crate::handler::{self, Context, Endpoint};
use crate::http::response::Kind;
use crate::http::{Method, Response};

mod error;
mod mount;
mod route;

pub use error::{Error, Result};
pub use mount::files::{serve_file, StaticFiles};
pub use mount::{Mount, Prefix};
pub use route::Route;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Router entry.
#[derive(Clone, Debug)]
pub enum Entry {
    /// Route matching an exact path.
    Route(Route),
    /// Mount matching a path prefix.
    Mount(Mount),
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Router.
///
/// The router holds an ordered table of routes and mounts, which are matched
/// against the request path and method in registration order. The first entry
/// that matches wins, so a route registered after a mount covering its path
/// is never reached. Unmatched requests are handed to the default endpoint,
/// which replies with `404` unless replaced.
///
/// Routers can be created with a path prefix, which is prepended to the paths
/// of all routes and mounts that are added.
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::handler::Endpoint;
/// use panda_serve::http::Method;
/// use panda_serve::router::{Entry, Route, Router};
/// use serde_json::json;
///
/// // Create router and add route
/// let mut router = Router::new();
/// router.add_route(Route::new(
///     Method::Get,
///     "/hello",
///     Endpoint::sync(|_| json!({ "msg": "hi" })),
/// )?);
///
/// // Find route
/// let entry = router.find_route("/hello", Method::Get);
/// assert!(matches!(entry, Some(Entry::Route(_))));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Router {
    /// Routes and mounts, in registration order.
    entries: Vec<Entry>,
    /// Endpoint for unmatched requests.
    default: Endpoint,
    /// Path prefix for routes and mounts.
    prefix: String,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Entry {
    /// Returns whether the entry matches the given path and method.
    #[must_use]
    pub fn matches(&self, path: &str, method: Method) -> bool {
        match self {
            Entry::Route(route) => route.matches(path, method),
            Entry::Mount(mount) => mount.matches(path, method),
        }
    }

    /// Handles the request described by the given context.
    ///
    /// # Errors
    ///
    /// This method returns the errors of the route or mount.
    pub async fn handle(
        &self, ctx: Context, default: &Endpoint,
    ) -> handler::Result<Response> {
        match self {
            Entry::Route(route) => route.handle(ctx).await,
            Entry::Mount(mount) => mount.handle(ctx, default).await,
        }
    }
}

impl Router {
    /// Creates a router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router prepending the given prefix to all paths.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Path`], if the prefix doesn't start with a
    /// slash, or ends with one without being the root.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::handler::Endpoint;
    /// use panda_serve::http::Method;
    /// use panda_serve::router::{Route, Router};
    ///
    /// // Create router with prefix and add route
    /// let mut router = Router::with_prefix("/api")?;
    /// let endpoint = Endpoint::sync(|_| "pong");
    /// router.add_route(Route::new(Method::Get, "/ping", endpoint)?);
    /// assert!(router.find_route("/api/ping", Method::Get).is_some());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_prefix<P>(prefix: P) -> Result<Self>
    where
        P: Into<String>,
    {
        let prefix = prefix.into();
        let trailing = prefix.len() > 1 && prefix.ends_with('/');
        if !prefix.starts_with('/') || trailing {
            return Err(Error::Path(prefix));
        }

        // Return router
        Ok(Self { prefix, ..Self::default() })
    }

    /// Adds a route.
    pub fn add_route(&mut self, mut route: Route) -> &mut Self {
        route.prepend(&self.prefix);
        debug!(method = %route.method(), path = route.path(), "route added");
        self.entries.push(Entry::Route(route));
        self
    }

    /// Adds a mount.
    ///
    /// If the mount has no fallback endpoint, the current default endpoint
    /// is used, so replacing the default endpoint afterwards doesn't affect
    /// the mount.
    pub fn add_mount(&mut self, mut mount: Mount) -> &mut Self {
        mount.prepend(&self.prefix);
        if !mount.has_fallback() {
            mount = mount.fallback(self.default.clone());
        }
        debug!(path = mount.path(), "mount added");
        self.entries.push(Entry::Mount(mount));
        self
    }

    /// Replaces the endpoint for unmatched requests.
    pub fn set_default_handler(&mut self, endpoint: Endpoint) -> &mut Self {
        info!("default handler replaced");
        self.default = endpoint;
        self
    }

    /// Returns the first entry matching the given path and method.
    #[must_use]
    pub fn find_route(&self, path: &str, method: Method) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.matches(path, method))
    }

    /// Dispatches the request described by the given context.
    ///
    /// The path is taken from the context, which allows middlewares to rewrite
    /// it before routing.
    ///
    /// # Errors
    ///
    /// This method returns the errors of the matched entry or the default
    /// endpoint, which are turned into `500` by the server.
    pub async fn dispatch(&self, ctx: Context) -> handler::Result<Response> {
        let method = ctx.request.method;
        if let Some(entry) = self.find_route(ctx.path(), method) {
            return entry.handle(ctx, &self.default).await;
        }

        // Hand unmatched requests to the default endpoint
        debug!(%method, path = ctx.path(), "no route matched");
        self.default.respond(ctx, Kind::default()).await
    }
}

#[allow(clippy::must_use_candidate)]
impl Router {
    /// Returns the default endpoint.
    #[inline]
    pub fn default_handler(&self) -> &Endpoint {
        &self.default
    }

    /// Returns the path prefix.
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the entries of the router.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether there are any entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::http::{Request, Status};
    use crate::pool::Pool;

    use super::*;

    fn context(method: Method, path: &str) -> Context {
        let req = Request::new().method(method).uri(path);
        Context::new(req, Pool::new(1).unwrap())
    }

    fn route(method: Method, path: &str, text: &'static str) -> Route {
        let endpoint = Endpoint::sync(move |_| text);
        Route::new(method, path, endpoint).unwrap().kind(Kind::Plain)
    }

    #[test]
    fn test_find_route() {
        let mut router = Router::new();
        router
            .add_route(route(Method::Get, "/a", "a"))
            .add_route(route(Method::Post, "/a", "b"));
        let test_cases = vec![
            ("/a", Method::Get, Some(0)),
            ("/a", Method::Post, Some(1)),
            ("/a", Method::Put, None),
            ("/b", Method::Get, None),
        ];
        for (path, method, expected) in test_cases {
            let entry = router.find_route(path, method);
            let index = entry.and_then(|entry| {
                router.entries().iter().position(|e| std::ptr::eq(e, entry))
            });
            assert_eq!(index, expected);
        }
    }

    #[test]
    fn test_with_prefix() {
        let mut router = Router::with_prefix("/api").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mount = Mount::new("/", StaticFiles::new(dir.path()).unwrap());
        router
            .add_route(route(Method::Get, "/a", "a"))
            .add_mount(mount.unwrap());

        let paths: Vec<_> = router
            .entries()
            .iter()
            .map(|entry| match entry {
                Entry::Route(route) => route.path(),
                Entry::Mount(mount) => mount.path(),
            })
            .collect();
        assert_eq!(paths, ["/api/a", "/api"]);

        // Invalid prefixes are rejected
        for prefix in ["api", "/api/"] {
            assert!(matches!(Router::with_prefix(prefix), Err(Error::Path(_))));
        }
    }

    #[tokio::test]
    async fn test_dispatch() {
        let mut router = Router::new();
        router.add_route(route(Method::Get, "/a", "a"));

        let res = router.dispatch(context(Method::Get, "/a")).await.unwrap();
        assert_eq!(res.body, b"a");
        let res = router.dispatch(context(Method::Get, "/b")).await.unwrap();
        assert_eq!(res.status, Status::NotFound);
        assert_eq!(res.body, b"404 Not Found");
    }

    #[tokio::test]
    async fn test_dispatch_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), "file").unwrap();

        let mut router = Router::new();
        let mount = Mount::new("/", StaticFiles::new(dir.path()).unwrap());
        router
            .add_mount(mount.unwrap())
            .add_route(route(Method::Get, "/a", "route"));

        let res = router.dispatch(context(Method::Get, "/a")).await.unwrap();
        assert_eq!(res.body, b"file");
    }

    #[tokio::test]
    async fn test_set_default_handler() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = Router::new();
        let mount = Mount::new("/static", StaticFiles::new(dir.path()).unwrap());
        router.add_mount(mount.unwrap());
        router.set_default_handler(Endpoint::sync(|_| "default"));

        // Mounts keep the default endpoint at the time they were added
        let ctx = context(Method::Get, "/static/a");
        let res = router.dispatch(ctx).await.unwrap();
        assert_eq!(res.status, Status::NotFound);

        let res = router.dispatch(context(Method::Get, "/x")).await.unwrap();
        assert_eq!(res.body, br#""default""#);
    }
}
