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

//! HTTP server.

use std::future;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::middleware::Pipeline;
use crate::pool::Pool;
use crate::router::Router;

mod builder;
mod config;
mod connection;
mod error;

pub use builder::Builder;
pub use config::Config;
pub use error::{Error, Result};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP server.
///
/// The server accepts connections on all bound addresses, and serves each of
/// them on its own task: the request is read, passed through the middleware
/// pipeline and router, and the response is written before the connection is
/// closed. Connections are never kept alive.
///
/// Tasks are scheduled cooperatively on a single thread, which is why all
/// blocking work, i.e., synchronous endpoints and file reads, is offloaded to
/// the worker pool.
///
/// # Examples
///
/// ```no_run
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::handler::Endpoint;
/// use panda_serve::http::Method;
/// use panda_serve::router::{Route, Router};
/// use panda_serve::server::Server;
///
/// // Create router and add route
/// let mut router = Router::new();
/// router.add_route(Route::new(
///     Method::Get,
///     "/",
///     Endpoint::sync(|_| "Hello, world!"),
/// )?);
///
/// // Create server and serve until interrupted
/// let server = Server::new(router, "127.0.0.1:8080")?;
/// server.run()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    /// Server context shared with connections.
    shared: Arc<Shared>,
    /// Listeners for incoming connections.
    listeners: Vec<std::net::TcpListener>,
}

/// Server context shared with connections.
#[derive(Debug)]
struct Shared {
    /// Router for incoming requests.
    router: Router,
    /// Middleware pipeline.
    pipeline: Pipeline,
    /// Worker pool.
    pool: Pool,
    /// Read and write timeout.
    timeout: Duration,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Server {
    /// Creates a server.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if the address can't be bound.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::router::Router;
    /// use panda_serve::server::Server;
    ///
    /// // Create server
    /// let server = Server::new(Router::new(), "127.0.0.1:0")?;
    /// # Ok(())
    /// # }
    /// ```
    #[inline]
    pub fn new<A>(router: Router, addr: A) -> Result<Self>
    where
        A: ToSocketAddrs,
    {
        Self::builder(router).bind(addr)?.listen()
    }

    /// Creates a server builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::router::Router;
    /// use panda_serve::server::Server;
    ///
    /// // Create server builder
    /// let builder = Server::builder(Router::new());
    /// ```
    #[inline]
    #[must_use]
    pub fn builder(router: Router) -> Builder {
        Builder::new(router)
    }

    /// Returns the addresses the server is bound to.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if an address can't be obtained.
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>> {
        self.listeners
            .iter()
            .map(|listener| listener.local_addr().map_err(Into::into))
            .collect()
    }

    /// Runs the server until interrupted with Ctrl-C.
    ///
    /// This method creates a single-threaded runtime, and blocks until the
    /// server is shut down. Use [`Server::serve`] to run the server inside an
    /// existing runtime.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if the runtime can't be created or
    /// serving fails.
    pub fn run(self) -> Result {
        let rt = runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(self.serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                // Without a signal handler, we serve until the process is killed
                warn!(%err, "can't listen for Ctrl-C");
                future::pending::<()>().await;
            }
            info!("stopping server by user request");
        }))
    }

    /// Serves connections until the given future completes.
    ///
    /// Once shut down, no new connections are accepted, and connections that
    /// are in flight are completed. Afterwards, the worker pool is shut down,
    /// which completes all submitted jobs.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if the listeners can't be registered
    /// with the runtime.
    pub async fn serve<F>(self, shutdown: F) -> Result
    where
        F: Future<Output = ()>,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        // Accept connections on all listeners, and funnel them into a single
        // channel, so connections are tracked in one place
        let mut acceptors = JoinSet::new();
        for listener in self.listeners {
            let listener = TcpListener::from_std(listener)?;
            info!(addr = %listener.local_addr()?, "server running");
            acceptors.spawn(accept(listener, sender.clone()));
        }
        drop(sender);

        // Spawn a task per connection until shut down
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                incoming = receiver.recv() => {
                    let Some((socket, peer)) = incoming else {
                        break;
                    };
                    let shared = Arc::clone(&self.shared);
                    connections.spawn(connection::handle(shared, socket, peer));
                }
                Some(res) = connections.join_next() => report(res),
            }
        }

        // Stop accepting, and complete connections in flight
        acceptors.shutdown().await;
        while let Some(res) = connections.join_next().await {
            report(res);
        }

        // Shut down worker pool, which blocks until all jobs are done
        info!("shutting down worker pool");
        let pool = self.shared.pool.clone();
        tokio::task::spawn_blocking(move || pool.shutdown())
            .await
            .map_err(io::Error::other)?;

        // No errors occurred
        info!("server shut down");
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Accepts connections, and sends them to the server.
async fn accept(
    listener: TcpListener, sender: UnboundedSender<(TcpStream, SocketAddr)>,
) {
    loop {
        match listener.accept().await {
            Ok(incoming) => {
                if sender.send(incoming).is_err() {
                    break;
                }
            }

            // Errors like running out of file descriptors are transient, so
            // we back off for a moment before accepting again
            Err(err) => {
                warn!(%err, "accepting connection failed");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// Reports connection tasks that terminated abnormally.
fn report(res: std::result::Result<(), JoinError>) {
    if let Err(err) = res {
        error!(%err, "connection task terminated abnormally");
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use std::sync::{mpsc as sync_mpsc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    use crate::handler::{Context, Endpoint};
    use crate::http::request::Query;
    use crate::http::response::Kind;
    use crate::http::{Method, Response};
    use crate::middleware::{Compress, Middleware};
    use crate::router::{Mount, Route, StaticFiles};

    use super::*;

    /// Running server for tests.
    struct Running {
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<Result>,
    }

    impl Running {
        async fn stop(self) {
            self.shutdown.send(()).unwrap();
            self.handle.await.unwrap().unwrap();
        }
    }

    fn router() -> Router {
        let mut router = Router::new();
        router
            .add_route(
                Route::new(
                    Method::Get,
                    "/hello",
                    Endpoint::sync(|_| json!({ "msg": "hi" })),
                )
                .unwrap(),
            )
            .add_route(
                Route::new(
                    Method::Post,
                    "/echo",
                    Endpoint::future(|ctx| async move {
                        ctx.request.body.json().cloned().unwrap_or(Value::Null)
                    }),
                )
                .unwrap(),
            )
            .add_route(
                Route::new(
                    Method::Post,
                    "/form",
                    Endpoint::future(|ctx| async move {
                        let form = ctx.request.body.form();
                        Value::from(form.map_or(0, Query::len))
                    }),
                )
                .unwrap(),
            )
            .add_route(
                Route::new(
                    Method::Get,
                    "/fail",
                    Endpoint::sync(|_| Err::<(), _>("failed")),
                )
                .unwrap(),
            )
            .add_route(
                Route::new(
                    Method::Get,
                    "/large",
                    Endpoint::sync(|_| "a".repeat(1000)),
                )
                .unwrap()
                .kind(Kind::Plain),
            )
            .add_route(
                Route::new(
                    Method::Get,
                    "/cookies",
                    Endpoint::future(|ctx| async move {
                        let cookies = ctx.request.cookies.get("id");
                        Response::builder(Kind::Json)
                            .header("Set-Cookie", "seen=1")
                            .content(json!({ "id": cookies }))
                    }),
                )
                .unwrap(),
            );
        router
    }

    async fn start(builder: Builder) -> Running {
        let server = builder.bind("127.0.0.1:0").unwrap().listen().unwrap();
        let addr = server.local_addrs().unwrap()[0];
        let (shutdown, receiver) = oneshot::channel();
        let handle = tokio::spawn(server.serve(async {
            let _ = receiver.await;
        }));
        Running { addr, shutdown, handle }
    }

    async fn request(addr: SocketAddr, raw: &[u8]) -> String {
        let mut socket = TcpStream::connect(addr).await.unwrap();
        socket.write_all(raw).await.unwrap();
        let mut buffer = Vec::new();
        socket.read_to_end(&mut buffer).await.unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    #[tokio::test]
    async fn test_hello() {
        let running = start(Server::builder(router()).workers(2)).await;
        let res = request(running.addr, b"GET /hello HTTP/1.1\r\n\r\n").await;
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(res.contains("content-type: application/json\r\n"));
        assert!(res.contains("content-length: 12\r\n"));
        assert!(res.contains("connection: close\r\n"));
        assert!(res.contains("date: "));
        assert!(res.ends_with("\r\n\r\n{\"msg\":\"hi\"}"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_missing() {
        let running = start(Server::builder(router())).await;
        let res = request(running.addr, b"GET /missing HTTP/1.1\r\n\r\n").await;
        assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(res.ends_with("\r\n\r\n404 Not Found"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_echo() {
        let running = start(Server::builder(router())).await;
        let raw = b"POST /echo HTTP/1.1\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 9\r\n\r\n\
            {\"a\":[1]}";
        let res = request(running.addr, raw).await;
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(res.ends_with("\r\n\r\n{\"a\":[1]}"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_cookies() {
        let running = start(Server::builder(router())).await;
        let raw = b"GET /cookies HTTP/1.1\r\nCookie: id=42; x=1\r\n\r\n";
        let res = request(running.addr, raw).await;
        assert!(res.contains("set-cookie: seen=1\r\n"));
        assert!(res.ends_with("{\"id\":\"42\"}"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_errors() {
        let running = start(Server::builder(router())).await;
        let test_cases: [(&[u8], &str); 5] = [
            (b"GET /fail HTTP/1.1\r\n\r\n", "500 Internal Server Error"),
            (b"BREW /hello HTTP/1.1\r\n\r\n", "501 Not Implemented"),
            (b"GET hello HTTP/1.1\r\n\r\n", "400 Bad Request"),
            (
                b"POST /echo HTTP/1.1\r\nContent-Length: x\r\n\r\n",
                "400 Bad Request",
            ),
            (
                b"POST /echo HTTP/1.1\r\n\
                  Content-Type: application/xml\r\n\
                  Content-Length: 4\r\n\r\n<a/>",
                "415 Unsupported Media Type",
            ),
        ];
        for (raw, status) in test_cases {
            let res = request(running.addr, raw).await;
            assert!(res.starts_with(&format!("HTTP/1.1 {status}\r\n")), "{res}");
        }
        running.stop().await;
    }

    #[tokio::test]
    async fn test_closed_before_request() {
        let running = start(Server::builder(router())).await;
        let mut socket = TcpStream::connect(running.addr).await.unwrap();
        socket.shutdown().await.unwrap();
        let mut buffer = Vec::new();
        socket.read_to_end(&mut buffer).await.unwrap();
        assert!(buffer.is_empty());
        running.stop().await;
    }

    #[tokio::test]
    async fn test_timeout() {
        let builder = Server::builder(router());
        let builder = builder.timeout(Duration::from_millis(100));
        let running = start(builder).await;
        let mut socket = TcpStream::connect(running.addr).await.unwrap();
        socket.write_all(b"GET /hello HTTP/1.1\r\n").await.unwrap();
        let mut buffer = Vec::new();
        socket.read_to_end(&mut buffer).await.unwrap();
        let res = String::from_utf8_lossy(&buffer);
        assert!(res.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_compress() {
        let builder = Server::builder(router()).with(Compress::default());
        let running = start(builder).await;
        let raw = b"GET /large HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n";
        let res = request(running.addr, raw).await;
        assert!(res.contains("content-encoding: gzip\r\n"));
        assert!(res.contains("vary: Accept-Encoding\r\n"));
        let res = request(running.addr, b"GET /large HTTP/1.1\r\n\r\n").await;
        assert!(!res.contains("content-encoding"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_form_with_many_keys() {
        let running = start(Server::builder(router())).await;
        let keys = (0..100_000).map(|n| format!("k{n}")).collect::<Vec<_>>();
        let body = keys.join("&");
        let raw = format!(
            "POST /form HTTP/1.1\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let res = request(running.addr, raw.as_bytes()).await;
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(res.ends_with("\r\n\r\n100000"));
        running.stop().await;
    }

    /// Middleware holding up the post hook of `/large` until released.
    struct Gate {
        entered: mpsc::UnboundedSender<()>,
        release: Mutex<sync_mpsc::Receiver<()>>,
    }

    impl Middleware for Gate {
        fn post(&self, ctx: &Context, res: Response) -> Response {
            if ctx.path() == "/large" {
                self.entered.send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            res
        }

        fn is_blocking(&self, ctx: &Context, _: &Response) -> bool {
            ctx.path() == "/large"
        }
    }

    #[tokio::test]
    async fn test_blocking_post_hook() {
        let (entered, mut entering) = mpsc::unbounded_channel();
        let (release, receiver) = sync_mpsc::channel();
        let gate = Gate { entered, release: Mutex::new(receiver) };
        let builder = Server::builder(router()).workers(2).with(gate);
        let running = start(builder).await;

        // Other connections are served while the post hook blocks
        let addr = running.addr;
        let large =
            tokio::spawn(request(addr, b"GET /large HTTP/1.1\r\n\r\n"));
        entering.recv().await.unwrap();
        let res = request(addr, b"GET /hello HTTP/1.1\r\n\r\n").await;
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));

        // Release post hook
        release.send(()).unwrap();
        let res = large.await.unwrap();
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_static_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "run()").unwrap();

        let mut router = router();
        let files = StaticFiles::new(dir.path()).unwrap();
        router.add_mount(Mount::new("/static", files).unwrap());
        let running = start(Server::builder(router)).await;

        let res = request(running.addr, b"GET /static/app.js\r\n\r\n").await;
        assert!(res.contains("content-type: text/javascript; charset=utf-8"));
        assert!(res.contains("last-modified: "));
        assert!(res.ends_with("\r\n\r\nrun()"));

        let raw = b"GET /static/../../etc/passwd HTTP/1.1\r\n\r\n";
        let res = request(running.addr, raw).await;
        assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"));
        running.stop().await;
    }

    #[test]
    fn test_no_address() {
        let res = Server::builder(Router::new()).listen();
        assert!(matches!(res, Err(Error::NoAddress)));
    }
}
