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

//! HTTP response error.

use std::result;
use thiserror::Error;

use crate::http::component;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP response error.
#[derive(Debug, Error)]
pub enum Error {
    /// Redirect without location.
    #[error("redirect requires a url or a location")]
    Location,

    /// Number that can't be represented in JSON.
    #[error("JSON can't represent NaN or infinite numbers")]
    NonFinite,

    /// Component error.
    #[error(transparent)]
    Component(#[from] component::Error),

    /// Serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// ----------------------------------------------------------------------------
// Type aliases
// ----------------------------------------------------------------------------

/// HTTP response result.
pub type Result<T = ()> = result::Result<T, Error>;
