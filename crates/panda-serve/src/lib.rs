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

//! HTTP/1.1 server engine.
//!
//! Connections are accepted on a single-threaded [`tokio`] scheduler, each
//! one driven through parsing, the [`Middleware`][] pipeline, the [`Router`]
//! and back, before the connection is closed. Synchronous endpoints and file
//! reads are offloaded to a bounded [`Pool`] of worker threads, so the
//! scheduler never blocks on them.
//!
//! [`Middleware`]: middleware::Middleware
//! [`Pool`]: pool::Pool
//! [`Router`]: router::Router
//!
//! # Examples
//!
//! ```no_run
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use panda_serve::handler::Endpoint;
//! use panda_serve::http::Method;
//! use panda_serve::router::{Route, Router};
//! use panda_serve::server::Server;
//! use serde_json::json;
//!
//! // Create router with a single route
//! let mut router = Router::new();
//! router.add_route(Route::new(
//!     Method::Get,
//!     "/hello",
//!     Endpoint::sync(|_| json!({ "msg": "hi" })),
//! )?);
//!
//! // Create server and serve until interrupted
//! let server = Server::builder(router)
//!     .bind("127.0.0.1:8080")?
//!     .listen()?;
//! server.run()?;
//! # Ok(())
//! # }
//! ```

pub mod handler;
pub mod http;
pub mod middleware;
pub mod pool;
pub mod router;
pub mod server;
