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

//! Handler dispatch.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use crate::http::response::Kind;
use crate::http::{Response, Status};

mod context;
mod error;
mod reply;

pub use context::Context;
pub use error::{BoxError, Error, Result};
pub use reply::{IntoReply, Reply};

// ----------------------------------------------------------------------------
// Type aliases
// ----------------------------------------------------------------------------

/// Boxed future returned by asynchronous endpoints.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Synchronous endpoint function.
type SyncFn = dyn Fn(Context) -> Result<Reply> + Send + Sync;

/// Asynchronous endpoint function.
type AsyncFn = dyn Fn(Context) -> BoxFuture<Result<Reply>> + Send + Sync;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Endpoint.
///
/// Endpoints are tagged at registration time. Synchronous endpoints may block,
/// which is why they're always run on the worker pool, while asynchronous
/// endpoints are awaited directly on the task serving the connection and must
/// never block. Both kinds receive the [`Context`] by value.
///
/// # Examples
///
/// ```
/// use panda_serve::handler::Endpoint;
/// use serde_json::json;
///
/// // Create synchronous endpoint
/// let endpoint = Endpoint::sync(|_| json!({ "msg": "hi" }));
/// assert!(!endpoint.is_async());
///
/// // Create asynchronous endpoint
/// let endpoint = Endpoint::future(|_| async { "hi" });
/// assert!(endpoint.is_async());
/// ```
#[derive(Clone)]
pub enum Endpoint {
    /// Synchronous endpoint, run on the worker pool.
    Sync(Arc<SyncFn>),
    /// Asynchronous endpoint, awaited on the connection task.
    Async(Arc<AsyncFn>),
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Endpoint {
    /// Creates a synchronous endpoint.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(Context) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Endpoint::Sync(Arc::new(move |ctx| f(ctx).into_reply()))
    }

    /// Creates an asynchronous endpoint.
    pub fn future<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Endpoint::Async(Arc::new(move |ctx| {
            let fut = f(ctx);
            Box::pin(async move { fut.await.into_reply() })
        }))
    }

    /// Creates the endpoint answering unmatched requests.
    ///
    /// This is the default endpoint of every router, which replies with `404`
    /// and the status line as plain text.
    #[must_use]
    pub fn not_found() -> Self {
        Endpoint::future(|_| async { Response::from_status(Status::NotFound) })
    }

    /// Calls the endpoint with the given context.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Endpoint`] if the endpoint failed, and
    /// [`Error::Pool`] if a synchronous endpoint couldn't be run, including
    /// when it panicked.
    pub async fn call(&self, ctx: Context) -> Result<Reply> {
        match self {
            Endpoint::Sync(f) => {
                let f = Arc::clone(f);
                let pool = ctx.pool().clone();
                pool.spawn(move || f(ctx)).await?
            }
            Endpoint::Async(f) => f(ctx).await,
        }
    }

    /// Calls the endpoint and renders its reply into a response.
    ///
    /// Content is rendered with the given kind, and the response headers of
    /// the context are seeded into the response. Responses returned by the
    /// endpoint are passed through unchanged.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Endpoint::call`].
    pub async fn respond(&self, ctx: Context, kind: Kind) -> Result<Response> {
        let headers = ctx.headers.clone();
        Ok(match self.call(ctx).await? {
            Reply::Response(res) => res,
            Reply::Content(content) => {
                Response::builder(kind).headers(&headers).content(content)
            }
        })
    }
}

#[allow(clippy::must_use_candidate)]
impl Endpoint {
    /// Returns whether the endpoint is asynchronous.
    #[inline]
    pub fn is_async(&self) -> bool {
        matches!(self, Endpoint::Async(_))
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Endpoint {
    /// Creates the endpoint answering unmatched requests.
    #[inline]
    fn default() -> Self {
        Self::not_found()
    }
}

impl fmt::Debug for Endpoint {
    /// Formats the endpoint for debugging.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(if self.is_async() {
            "Endpoint::Async"
        } else {
            "Endpoint::Sync"
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::thread;

    use crate::http::{Header, Request};
    use crate::pool::{self, Pool};

    use super::*;

    fn context() -> Context {
        Context::new(Request::new().uri("/hello"), Pool::new(1).unwrap())
    }

    #[tokio::test]
    async fn test_sync_runs_on_worker() {
        let endpoint = Endpoint::sync(|_| {
            let name = thread::current().name().map(String::from);
            name.unwrap_or_default()
        });
        let res = endpoint.respond(context(), Kind::Plain).await.unwrap();
        assert!(res.body.starts_with(b"panda/worker-"));
    }

    #[tokio::test]
    async fn test_respond() {
        let endpoint = Endpoint::future(|ctx| async move {
            json!({ "path": ctx.path() })
        });
        let mut ctx = context();
        ctx.headers.insert("X-Trace", "1");
        let res = endpoint.respond(ctx, Kind::Json).await.unwrap();
        assert_eq!(res.status, Status::Ok);
        assert_eq!(res.body, br#"{"path":"/hello"}"#);
        assert_eq!(res.headers.get(Header::ContentType), Some("application/json"));
        assert_eq!(res.headers.get("x-trace"), Some("1"));
    }

    #[tokio::test]
    async fn test_respond_passes_response_through() {
        let endpoint = Endpoint::sync(|_| Response::redirect("/a"));
        let mut ctx = context();
        ctx.headers.insert("X-Trace", "1");
        let res = endpoint.respond(ctx, Kind::Json).await.unwrap();
        assert_eq!(res, Response::redirect("/a"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let res = Endpoint::default()
            .respond(context(), Kind::Json)
            .await
            .unwrap();
        assert_eq!(res.status, Status::NotFound);
        assert_eq!(res.body, b"404 Not Found");
    }

    #[tokio::test]
    async fn test_errors() {
        let endpoint = Endpoint::sync(|_| Err::<(), _>("failed"));
        let res = endpoint.call(context()).await;
        assert!(matches!(res, Err(Error::Endpoint(_))));

        let endpoint = Endpoint::sync(|_| -> () { panic!("boom") });
        let res = endpoint.call(context()).await;
        assert!(matches!(res, Err(Error::Pool(pool::Error::Panicked))));
    }
}
