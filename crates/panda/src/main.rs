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

//! Panda HTTP server.
//!
//! Serves a small set of demo routes, and the files in `./public` below the
//! `/static` path, if that directory exists. The configuration is read from
//! the JSON file passed as the first argument, e.g.:
//!
//! ```json
//! { "ip": "127.0.0.1", "port": 8080, "max_workers": 4, "timeout": 10 }
//! ```

use serde_json::{json, Map, Value};
use std::env;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use panda_serve::handler::{Context, Endpoint};
use panda_serve::http::request::Body;
use panda_serve::http::response::{self, Kind};
use panda_serve::http::{Method, Response};
use panda_serve::middleware::Compress;
use panda_serve::router::{self, Mount, Route, Router, StaticFiles};
use panda_serve::server::{Config, Server};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Directory served below `/static`.
const PUBLIC_DIR: &str = "public";

/// Port used without configuration file.
const DEFAULT_PORT: u16 = 8080;

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Sets up logging, honoring `RUST_LOG` and defaulting to `info`.
fn setup_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Registers the demo routes.
fn routes(router: &mut Router) -> router::Result {
    let index = Endpoint::sync(|_| "<h1>Panda</h1><p>It works!</p>");
    let index = Route::new(Method::Get, "/", index)?.kind(Kind::Html);
    router
        .add_route(index)
        .add_route(Route::new(Method::Get, "/hello", Endpoint::sync(hello))?)
        .add_route(Route::new(Method::Post, "/echo", Endpoint::sync(echo))?)
        .add_route(Route::new(Method::Get, "/sleep", Endpoint::future(sleep))?);

    // Register routes showing cookies and redirects
    let endpoint = Endpoint::sync(cookies);
    router.add_route(Route::new(Method::Get, "/cookies", endpoint)?);
    let endpoint = Endpoint::sync(redirect);
    router.add_route(Route::new(Method::Get, "/redirect", endpoint)?);
    Ok(())
}

/// Greets the client.
fn hello(_: Context) -> Value {
    json!({ "msg": "hi" })
}

/// Echoes the decoded request body.
fn echo(ctx: Context) -> serde_json::Result<Value> {
    match &ctx.request.body {
        Body::Json(value) => Ok(value.clone()),
        Body::Form(query) => serde_json::to_value(query),
        Body::Raw(bytes) => Ok(json!({ "length": bytes.len() })),
    }
}

/// Lists the cookies sent by the client.
fn cookies(ctx: Context) -> Value {
    let iter = ctx.request.cookies.iter();
    let cookies = iter
        .map(|(name, value)| (name.clone(), Value::from(value.as_str())))
        .collect::<Map<_, _>>();
    Value::Object(cookies)
}

/// Redirects to the greeting.
fn redirect(_: Context) -> response::Result<Response> {
    let body = json!({ "location": "/hello", "status_code": 302 });
    Response::try_redirect(None, Some(&body))
}

/// Replies after a second, without blocking other connections.
async fn sleep(_: Context) -> &'static str {
    tokio::time::sleep(Duration::from_secs(1)).await;
    "Good morning!"
}

/// Creates and runs the server.
fn run() -> Result<(), Box<dyn Error>> {
    let config = match env::args_os().nth(1) {
        Some(path) => Config::from_path(path)?,
        None => Config { port: DEFAULT_PORT, ..Config::default() },
    };

    // Create router from configuration, and register routes
    let mut router = config.router()?;
    routes(&mut router)?;
    if Path::new(PUBLIC_DIR).is_dir() {
        let files = StaticFiles::new(PUBLIC_DIR)?;
        router.add_mount(Mount::new("/static", files)?);
    }

    // Create server and serve until interrupted
    let server = Server::builder(router)
        .with(Compress::default())
        .config(&config)?
        .listen()?;
    server.run().map_err(Into::into)
}

// ----------------------------------------------------------------------------
// Program
// ----------------------------------------------------------------------------

fn main() -> ExitCode {
    setup_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server failed");
            ExitCode::FAILURE
        }
    }
}
