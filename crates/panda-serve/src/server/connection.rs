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

//! HTTP connection.

use httpdate::fmt_http_date;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::handler::Context;
use crate::http::request::{self, Error};
use crate::http::{Header, Request, Response, Status};
use crate::pool::{self, Pool};

use super::Shared;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Size of chunks read from the socket.
const CHUNK_SIZE: usize = 4096;

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Serves a single request on the given connection, and closes it.
///
/// Requests that can't be parsed are answered with the status derived from
/// the parse error, and requests that aren't received in time with `408`.
/// Connections closed before sending anything are dropped silently.
pub(super) async fn handle(
    shared: Arc<Shared>, mut socket: TcpStream, peer: SocketAddr,
) {
    let res = match timeout(shared.timeout, read(&mut socket)).await {
        Ok(Ok(Some((req, body)))) => {
            match attach(&shared.pool, req, body).await {
                Ok(Ok(req)) => process(&shared, req, peer).await,
                Ok(Err(err)) => {
                    debug!(%peer, %err, "invalid request body");
                    Response::from_status(err.status())
                }
                Err(err) => {
                    error!(%peer, %err, "decoding request body failed");
                    Response::from_status(Status::InternalServerError)
                }
            }
        }
        Ok(Ok(None)) => {
            debug!(%peer, "connection closed before request");
            return;
        }

        // Failing to read from the socket means we can't answer anyway
        Ok(Err(Error::Io(err))) => {
            debug!(%peer, %err, "reading request failed");
            return;
        }
        Ok(Err(err)) => {
            debug!(%peer, %err, "invalid request");
            Response::from_status(err.status())
        }
        Err(_) => {
            debug!(%peer, "request timed out");
            Response::from_status(Status::RequestTimeout)
        }
    };

    // Send response and close connection
    match timeout(shared.timeout, send(&mut socket, res)).await {
        Ok(Ok(())) => debug!(%peer, "request handled"),
        Ok(Err(err)) => debug!(%peer, %err, "sending response failed"),
        Err(_) => debug!(%peer, "sending response timed out"),
    }
}

/// Reads a request and its undecoded body from the given socket.
///
/// Returns [`None`], if the connection was closed before any bytes arrived.
async fn read(
    socket: &mut TcpStream,
) -> request::Result<Option<(Request, Vec<u8>)>> {
    let mut buffer = Vec::with_capacity(CHUNK_SIZE);
    let mut chunk = [0u8; CHUNK_SIZE];

    // Read until the header block is complete
    let (req, offset) = loop {
        if let Some(head) = Request::from_head(&buffer)? {
            break head;
        }
        let bytes = socket.read(&mut chunk).await?;
        if bytes == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return Err(Error::Incomplete);
        }
        buffer.extend_from_slice(&chunk[..bytes]);
    };

    // Some bytes of the body might already be buffered, and the client might
    // send more than announced, which we ignore
    let length = req.content_length()?;
    let mut body = buffer.split_off(offset);
    body.truncate(length);

    // Read remaining bytes of body
    let start = body.len();
    if start < length {
        body.resize(length, 0);
        socket
            .read_exact(&mut body[start..])
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::UnexpectedEof => Error::Incomplete,
                _ => Error::Io(err),
            })?;
    }

    // Return request and body
    Ok(Some((req, body)))
}

/// Attaches the given body to the request.
///
/// Decoding large form or JSON bodies takes time, which is why non-empty
/// bodies are decoded on the worker pool.
async fn attach(
    pool: &Pool, req: Request, body: Vec<u8>,
) -> pool::Result<request::Result<Request>> {
    if body.is_empty() {
        return Ok(req.with_body(body));
    }
    pool.spawn(move || req.with_body(body)).await
}

/// Processes the given request through the pipeline and router.
///
/// Handler errors are logged and answered with `500`, after which the post
/// hooks of the pipeline still run. If a post hook can't be run, the request
/// is answered with `500` as well.
async fn process(shared: &Shared, req: Request, peer: SocketAddr) -> Response {
    let ip = req
        .headers
        .get(Header::CfConnectingIp)
        .map_or_else(|| peer.ip().to_string(), String::from);
    info!(%ip, method = %req.method, path = %req.uri.path, "request received");

    // Run pre hooks, then dispatch to the router
    let mut ctx = Context::new(req, shared.pool.clone());
    shared.pipeline.pre(&mut ctx);
    let res = match shared.router.dispatch(ctx.clone()).await {
        Ok(res) => res,
        Err(err) => {
            let method = ctx.request.method;
            error!(%err, %method, path = ctx.path(), "handler failed");
            Response::from_status(Status::InternalServerError)
        }
    };

    // Run post hooks in reverse order
    match shared.pipeline.post(&ctx, res).await {
        Ok(res) => res,
        Err(err) => {
            error!(%err, path = ctx.path(), "post hook failed");
            Response::from_status(Status::InternalServerError)
        }
    }
}

/// Sends the given response, and shuts the socket down.
async fn send(socket: &mut TcpStream, mut res: Response) -> io::Result<()> {
    let date = fmt_http_date(SystemTime::now());
    res.headers.insert_default(Header::Date, date);
    res.headers.insert_default(Header::Connection, "close");

    // Write response and close connection
    socket.write_all(&res.into_bytes()).await?;
    socket.shutdown().await
}
