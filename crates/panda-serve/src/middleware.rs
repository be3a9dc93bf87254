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

//! Middleware pipeline.

use std::fmt;
use std::sync::Arc;

use crate::handler::Context;
use crate::http::Response;
use crate::pool;

mod compress;
mod info;

pub use compress::Compress;
pub use info::RequestInfo;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Middleware.
///
/// Middlewares observe every request twice: the pre hook runs before routing
/// and may modify the context, e.g., to record request metadata or seed
/// response headers, and the post hook runs after the endpoint and may replace
/// the response. Both hooks default to doing nothing.
///
/// Hooks run on the connection scheduler, so they must not block. Post hooks
/// doing expensive work, like compressing large bodies, report so through
/// [`Middleware::is_blocking`], and are then run on the worker pool.
///
/// # Examples
///
/// ```
/// use panda_serve::handler::Context;
/// use panda_serve::http::Response;
/// use panda_serve::middleware::Middleware;
///
/// // Define middleware adding a header to all responses
/// struct Powered;
///
/// impl Middleware for Powered {
///     fn post(&self, _: &Context, res: Response) -> Response {
///         res.header("X-Powered-By", "panda")
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Runs before the request is routed.
    fn pre(&self, ctx: &mut Context) {
        let _ = ctx;
    }

    /// Runs after the endpoint produced a response.
    fn post(&self, ctx: &Context, res: Response) -> Response {
        let _ = ctx;
        res
    }

    /// Returns whether the post hook blocks for the given response.
    fn is_blocking(&self, ctx: &Context, res: &Response) -> bool {
        let _ = (ctx, res);
        false
    }
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Middleware pipeline.
///
/// The pipeline always starts with [`RequestInfo`], so the request metadata
/// is available to all middlewares that are added afterwards. Pre hooks run
/// in the order middlewares were added, post hooks in reverse order, so the
/// first middleware sees the request first and the response last.
///
/// # Examples
///
/// ```
/// use panda_serve::middleware::{Compress, Pipeline};
///
/// // Create pipeline and add middleware
/// let pipeline = Pipeline::new().with(Compress::default());
/// assert_eq!(pipeline.len(), 2);
/// ```
pub struct Pipeline {
    /// Middlewares in registration order.
    middlewares: Vec<Arc<dyn Middleware>>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Pipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middlewares: vec![Arc::new(RequestInfo)],
        }
    }

    /// Adds a middleware.
    pub fn add<M>(&mut self, middleware: M)
    where
        M: Middleware,
    {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Adds a middleware, returning the pipeline.
    #[must_use]
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.add(middleware);
        self
    }

    /// Runs the pre hooks of all middlewares in order.
    pub fn pre(&self, ctx: &mut Context) {
        for middleware in &self.middlewares {
            middleware.pre(ctx);
        }
    }

    /// Runs the post hooks of all middlewares in reverse order.
    ///
    /// Post hooks that block for the response are run on the worker pool of
    /// the context, all others in place.
    ///
    /// # Errors
    ///
    /// This method returns [`pool::Error`], if a post hook couldn't be run on
    /// the worker pool, including when it panicked.
    pub async fn post(
        &self, ctx: &Context, mut res: Response,
    ) -> pool::Result<Response> {
        for middleware in self.middlewares.iter().rev() {
            if !middleware.is_blocking(ctx, &res) {
                res = middleware.post(ctx, res);
                continue;
            }

            // Hand response over to worker pool, and wait for it
            let middleware = Arc::clone(middleware);
            let scope = ctx.clone();
            res = ctx
                .pool()
                .spawn(move || middleware.post(&scope, res))
                .await?;
        }
        Ok(res)
    }
}

#[allow(clippy::must_use_candidate)]
impl Pipeline {
    /// Returns the number of middlewares.
    #[inline]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns whether there are any middlewares.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Pipeline {
    /// Creates a pipeline.
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pipeline {
    /// Formats the pipeline for debugging.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("len", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::http::{Method, Request};
    use crate::pool::Pool;

    use super::*;

    struct Trace {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Trace {
        fn pre(&self, ctx: &mut Context) {
            let method = ctx.values.get("method").unwrap_or("-");
            let entry = format!("pre {} {method}", self.name);
            self.log.lock().unwrap().push(entry);
        }

        fn post(&self, _: &Context, res: Response) -> Response {
            self.log.lock().unwrap().push(format!("post {}", self.name));
            res.header("X-Last", self.name)
        }
    }

    #[tokio::test]
    async fn test_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .with(Trace { name: "a", log: Arc::clone(&log) })
            .with(Trace { name: "b", log: Arc::clone(&log) });

        let req = Request::new().method(Method::Post);
        let mut ctx = Context::new(req, Pool::new(1).unwrap());
        pipeline.pre(&mut ctx);
        let res = pipeline.post(&ctx, Response::new()).await.unwrap();

        assert_eq!(res.headers.get("x-last"), Some("a"));
        assert_eq!(
            *log.lock().unwrap(),
            ["pre a POST", "pre b POST", "post b", "post a"]
        );
    }

    struct Worker;

    impl Middleware for Worker {
        fn post(&self, _: &Context, res: Response) -> Response {
            let name = std::thread::current().name().map(String::from);
            res.header("X-Thread", name.unwrap_or_default())
        }

        fn is_blocking(&self, _: &Context, _: &Response) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_blocking_post_runs_on_worker() {
        let pipeline = Pipeline::new().with(Worker);
        let ctx = Context::new(Request::new(), Pool::new(1).unwrap());
        let res = pipeline.post(&ctx, Response::new()).await.unwrap();
        let name = res.headers.get("x-thread").unwrap_or_default();
        assert!(name.starts_with("panda/worker-"));
    }
}
