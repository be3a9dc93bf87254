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

//! HTTP server configuration.

use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::router::Router;

use super::Result;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP server configuration.
///
/// All fields are optional when deserializing, and fall back to their default
/// values, which are listed next to each field.
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::server::Config;
///
/// // Create configuration from JSON
/// let config = Config::from_json(r#"{ "port": 8080, "timeout": 5 }"#)?;
/// assert_eq!(config.addr().to_string(), "0.0.0.0:8080");
/// assert_eq!(config.listen, 1000);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Address to bind to, `0.0.0.0` by default.
    pub ip: IpAddr,
    /// Port to bind to, `80` by default.
    pub port: u16,
    /// Listen backlog, `1000` by default.
    pub listen: i32,
    /// Number of worker threads, the available parallelism by default.
    pub max_workers: Option<usize>,
    /// Read and write timeout in seconds, `30` by default.
    pub timeout: u64,
    /// Path prefix for routes and mounts, `/` by default.
    pub prefix: String,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Config {
    /// Creates a configuration from the given JSON string.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Config`][], if the JSON is invalid.
    ///
    /// [`Error::Config`]: crate::server::Error::Config
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Creates a configuration from the JSON file at the given path.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`][], if the file can't be read, and
    /// [`Error::Config`][] if the JSON is invalid.
    ///
    /// [`Error::Config`]: crate::server::Error::Config
    /// [`Error::Io`]: crate::server::Error::Io
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Creates a router using the configured path prefix.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Router`][], if the prefix is invalid.
    ///
    /// [`Error::Router`]: crate::server::Error::Router
    pub fn router(&self) -> Result<Router> {
        Router::with_prefix(self.prefix.as_str()).map_err(Into::into)
    }

    /// Returns the socket address to bind to.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Returns the read and write timeout.
    #[inline]
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Config {
    /// Creates a default configuration.
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 80,
            listen: 1000,
            max_workers: None,
            timeout: 30,
            prefix: String::from("/"),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::server::Error;

    use super::*;

    #[test]
    fn test_from_json() {
        let config = Config::from_json(
            r#"{ "ip": "127.0.0.1", "max_workers": 4, "prefix": "/api" }"#,
        );
        let config = config.unwrap();
        assert_eq!(config.addr().to_string(), "127.0.0.1:80");
        assert_eq!(config.max_workers, Some(4));
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.router().unwrap().prefix(), "/api");
    }

    #[test]
    fn test_from_json_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
        assert!(matches!(
            Config::from_json(r#"{ "port": "http" }"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "port": 8080 }"#).unwrap();
        assert_eq!(Config::from_path(&path).unwrap().port, 8080);
        assert!(matches!(
            Config::from_path(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_router_invalid_prefix() {
        let config = Config { prefix: "api/".into(), ..Config::default() };
        assert!(matches!(config.router(), Err(Error::Router(_))));
    }
}
