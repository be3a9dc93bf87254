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

//! Request information middleware.

use crate::handler::Context;

use super::Middleware;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Request information middleware.
///
/// Records the method, path and protocol of the request in the metadata of
/// the context, where routing and logging pick them up.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestInfo;

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for RequestInfo {
    fn pre(&self, ctx: &mut Context) {
        let req = &ctx.request;
        ctx.values.insert("method", req.method);
        ctx.values.insert("path", &req.uri.path);
        ctx.values.insert("protocol", &req.protocol);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::http::{Method, Request};
    use crate::pool::Pool;

    use super::*;

    #[test]
    fn test_pre() {
        let req = Request::from_bytes(b"PUT /a%20b?x=1 HTTP/1.0\r\n\r\n");
        let mut ctx = Context::new(req.unwrap(), Pool::new(1).unwrap());
        RequestInfo.pre(&mut ctx);
        assert_eq!(ctx.values.get("method"), Some(Method::Put.name()));
        assert_eq!(ctx.values.get("path"), Some("/a b"));
        assert_eq!(ctx.values.get("protocol"), Some("HTTP/1.0"));
    }
}
