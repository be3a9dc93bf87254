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

//! HTTP request error.

use std::{io, result};
use thiserror::Error;

use crate::http::component::{self, Status};

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP request error.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Connection closed before the request was complete.
    #[error("incomplete request")]
    Incomplete,

    /// Component error.
    #[error(transparent)]
    Component(#[from] component::Error),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(Status),

    /// Invalid JSON body.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported content type.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Error {
    /// Returns the status to answer the request with.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_serve::http::request::Error;
    /// use panda_serve::http::Status;
    ///
    /// // Obtain status for unsupported content type
    /// let err = Error::UnsupportedContentType("application/xml".into());
    /// assert_eq!(err.status(), Status::UnsupportedMediaType);
    /// ```
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Error::Io(_) | Error::Incomplete | Error::Json(_) => {
                Status::BadRequest
            }
            Error::Component(component::Error::Method(_)) => {
                Status::NotImplemented
            }
            Error::Component(component::Error::Status(_)) => {
                Status::InternalServerError
            }
            Error::Validation(status) => *status,
            Error::UnsupportedContentType(_) => Status::UnsupportedMediaType,
        }
    }
}

// ----------------------------------------------------------------------------
// Type aliases
// ----------------------------------------------------------------------------

/// HTTP request result.
pub type Result<T = ()> = result::Result<T, Error>;
