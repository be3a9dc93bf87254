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

//! HTTP server builder.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::middleware::{Middleware, Pipeline};
use crate::pool::Pool;
use crate::router::Router;

use super::{Config, Error, Result, Server, Shared};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP server builder.
#[derive(Debug)]
pub struct Builder {
    /// Router for incoming requests.
    router: Router,
    /// Middleware pipeline.
    pipeline: Pipeline,
    /// Socket addresses to bind to.
    addrs: Vec<SocketAddr>,
    /// Listen backlog.
    backlog: i32,
    /// Number of worker threads.
    workers: usize,
    /// Read and write timeout.
    timeout: Duration,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Builder {
    /// Creates a server builder.
    ///
    /// Note that the canonical way to create a [`Server`] is to invoke the
    /// [`Server::builder`] method, which creates an instance of [`Builder`].
    /// However, if only a single address needs to be bound, it can be done
    /// directly using the [`Server::new`] method.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::router::Router;
    /// use panda_serve::server::Builder;
    ///
    /// // Create server builder
    /// let builder = Builder::new(Router::new());
    /// ```
    #[must_use]
    pub fn new(router: Router) -> Self {
        let config = Config::default();
        Self {
            router,
            pipeline: Pipeline::new(),
            addrs: Vec::new(),
            backlog: config.listen,
            workers: Pool::default_size(),
            timeout: config.read_timeout(),
        }
    }

    /// Adds a socket address to bind to.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if the address can't be resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::router::Router;
    /// use panda_serve::server::Builder;
    ///
    /// // Create server builder and add address
    /// let builder = Builder::new(Router::new())
    ///     .bind("127.0.0.1:8080")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn bind<A>(mut self, addr: A) -> Result<Self>
    where
        A: ToSocketAddrs,
    {
        // The underlying system call might return the same socket address
        // multiple times, which is why we need to deduplicate them
        let addrs = addr.to_socket_addrs()?;
        for addr in addrs {
            if !self.addrs.contains(&addr) {
                self.addrs.push(addr);
            }
        }
        Ok(self)
    }

    /// Sets the listen backlog.
    #[inline]
    #[must_use]
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Sets the number of worker threads.
    #[inline]
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the read and write timeout of connections.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a middleware to the pipeline.
    #[must_use]
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.pipeline.add(middleware);
        self
    }

    /// Applies the given configuration.
    ///
    /// The configured address is added to the addresses to bind to. Note that
    /// the path prefix is applied by the router, see [`Config::router`].
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if the address can't be resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::server::{Builder, Config};
    ///
    /// // Create server builder from configuration
    /// let config = Config::from_json(r#"{ "port": 8080 }"#)?;
    /// let builder = Builder::new(config.router()?).config(&config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn config(self, config: &Config) -> Result<Self> {
        let workers = config.max_workers.unwrap_or(self.workers);
        let builder = self
            .backlog(config.listen)
            .workers(workers)
            .timeout(config.read_timeout());
        builder.bind(config.addr())
    }

    /// Creates the server and binds to the configured addresses.
    ///
    /// Listeners are bound here, so the addresses are in use once this method
    /// returns, while connections are only accepted once the server runs.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::NoAddress`], if no address was added, and
    /// [`Error::Io`] if binding fails or the worker pool can't be created.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::router::Router;
    /// use panda_serve::server::Builder;
    ///
    /// // Create server builder and bind to address
    /// let server = Builder::new(Router::new())
    ///     .bind("127.0.0.1:0")?
    ///     .listen()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn listen(self) -> Result<Server> {
        if self.addrs.is_empty() {
            return Err(Error::NoAddress);
        }

        // Bind listeners to all configured addresses
        let listeners = self
            .addrs
            .iter()
            .map(|&addr| bind(addr, self.backlog))
            .collect::<Result<Vec<_>>>()?;

        // Create worker pool, and return server
        let pool = Pool::new(self.workers)?;
        info!(workers = pool.size(), "worker pool initialized");
        Ok(Server {
            shared: Arc::new(Shared {
                router: self.router,
                pipeline: self.pipeline,
                pool,
                timeout: self.timeout,
            }),
            listeners,
        })
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Binds a non-blocking listener with the given backlog.
fn bind(addr: SocketAddr, backlog: i32) -> Result<TcpListener> {
    let domain = Domain::for_address(addr);
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}
