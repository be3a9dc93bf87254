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

//! Mount.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::handler::{self, Context, Endpoint};
use crate::http::response::Kind;
use crate::http::{Method, Response};

use super::error::{Error, Result};

pub mod files;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Mount target.
///
/// Targets provide the directory that paths below a mount are resolved in.
pub trait Prefix: Send + Sync {
    /// Returns the directory of the target.
    fn prefix(&self) -> &Path;
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Mount.
///
/// A mount maps all `GET` requests below a path prefix onto a directory, which
/// is provided by its target. Matching happens on segment boundaries, so the
/// prefix `/static` matches `/static` and `/static/app.js`, but not the path
/// `/statically`. Requests for files that don't exist are handed to the
/// fallback endpoint, which defaults to the default endpoint of the router
/// at the time the mount is added.
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::router::{Mount, StaticFiles};
///
/// // Create mount
/// let mount = Mount::new("/static", StaticFiles::new(".")?)?;
/// assert!(mount.resolve("/static/../../etc/passwd").is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Mount {
    /// Path prefix without trailing slash.
    path: String,
    /// Mount target.
    target: Arc<dyn Prefix>,
    /// Fallback endpoint.
    fallback: Option<Endpoint>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Mount {
    /// Creates a mount.
    ///
    /// A trailing slash is removed from the path, except for the root.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Path`], if the path doesn't start with a
    /// slash.
    pub fn new<P, T>(path: P, target: T) -> Result<Self>
    where
        P: Into<String>,
        T: Prefix + 'static,
    {
        let mut path = path.into();
        if !path.starts_with('/') {
            return Err(Error::Path(path));
        }

        // Normalize trailing slashes
        while path.len() > 1 && path.ends_with('/') {
            path.pop();
        }

        // Return mount
        Ok(Self {
            path,
            target: Arc::new(target),
            fallback: None,
        })
    }

    /// Sets the fallback endpoint for files that don't exist.
    #[inline]
    #[must_use]
    pub fn fallback(mut self, endpoint: Endpoint) -> Self {
        self.fallback = Some(endpoint);
        self
    }

    /// Returns whether the mount matches the given path and method.
    #[must_use]
    pub fn matches(&self, path: &str, method: Method) -> bool {
        method == Method::Get && self.relative(path).is_some()
    }

    /// Resolves the given request path to a path inside the target.
    ///
    /// Resolution is purely lexical: `.` segments are skipped, `..` segments
    /// remove the previous segment, and paths that would escape the target
    /// directory are rejected. Symbolic links are checked when the file is
    /// served.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::router::{Mount, StaticFiles};
    ///
    /// // Create mount and resolve path
    /// let files = StaticFiles::new(".")?;
    /// let root = std::env::current_dir()?.canonicalize()?;
    /// let mount = Mount::new("/static", files)?;
    /// assert_eq!(
    ///     mount.resolve("/static/img/./a.png"),
    ///     Some(root.join("img/a.png"))
    /// );
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = self.relative(path)?;
        let mut resolved = self.target.prefix().to_path_buf();

        // Apply segments, tracking depth below the target directory
        let mut depth = 0_usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    depth += 1;
                }
                Component::ParentDir => {
                    depth = depth.checked_sub(1)?;
                    resolved.pop();
                }
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        // Return resolved path
        Some(resolved)
    }

    /// Handles the request described by the given context.
    ///
    /// The file is served if it exists, otherwise the fallback endpoint, or
    /// the given default endpoint if there's none, is called.
    ///
    /// # Errors
    ///
    /// This method returns [`handler::Error::Io`], if an existing file can't
    /// be read, and the errors of [`Endpoint::respond`] for the fallback.
    pub async fn handle(
        &self, ctx: Context, default: &Endpoint,
    ) -> handler::Result<Response> {
        if let Some(path) = self.resolve(ctx.path()) {
            let root = self.target.prefix().to_path_buf();
            if let Some(res) = files::serve(&ctx, path, Some(root)).await? {
                return Ok(res);
            }
        }

        // Hand missing files to the fallback
        let fallback = self.fallback.as_ref().unwrap_or(default);
        fallback.respond(ctx, Kind::Plain).await
    }

    /// Prepends the given prefix to the path.
    pub(super) fn prepend(&mut self, prefix: &str) {
        if prefix == "/" {
            return;
        }
        if self.path == "/" {
            self.path = prefix.to_string();
        } else {
            self.path.insert_str(0, prefix);
        }
    }

    /// Returns the path relative to the prefix, if the prefix matches.
    fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.path.as_str())?;
        if self.path == "/" || rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

#[allow(clippy::must_use_candidate)]
impl Mount {
    /// Returns the path prefix.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns whether the mount has a fallback endpoint.
    #[inline]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl fmt::Debug for Mount {
    /// Formats the mount for debugging.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mount")
            .field("path", &self.path)
            .field("prefix", &self.target.prefix())
            .field("fallback", &self.fallback)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::http::{Request, Status};
    use crate::pool::Pool;

    use super::*;

    struct Root(PathBuf);

    impl Prefix for Root {
        fn prefix(&self) -> &Path {
            &self.0
        }
    }

    fn context(path: &str) -> Context {
        Context::new(Request::new().uri(path), Pool::new(1).unwrap())
    }

    #[test]
    fn test_new() {
        let mount = Mount::new("/static/", Root("/var/www".into())).unwrap();
        assert_eq!(mount.path(), "/static");
        let mount = Mount::new("/", Root("/var/www".into())).unwrap();
        assert_eq!(mount.path(), "/");
        assert!(matches!(
            Mount::new("static", Root("/var/www".into())),
            Err(Error::Path(_))
        ));
    }

    #[test]
    fn test_matches() {
        let mount = Mount::new("/static", Root("/var/www".into())).unwrap();
        let test_cases = vec![
            ("/static", Method::Get, true),
            ("/static/", Method::Get, true),
            ("/static/app.js", Method::Get, true),
            ("/static/app.js", Method::Post, false),
            ("/statically", Method::Get, false),
            ("/", Method::Get, false),
        ];
        for (path, method, expected) in test_cases {
            assert_eq!(mount.matches(path, method), expected, "{path}");
        }
    }

    #[test]
    fn test_resolve() {
        let mount = Mount::new("/static", Root("/var/www".into())).unwrap();
        let test_cases = vec![
            ("/static/img/a.png", Some("/var/www/img/a.png")),
            ("/static/img/../a.png", Some("/var/www/a.png")),
            ("/static/./a.png", Some("/var/www/a.png")),
            ("/static", Some("/var/www")),
            ("/static/../etc/passwd", None),
            ("/static/img/../../etc/passwd", None),
            ("/static//etc/passwd", None),
            ("/other/a.png", None),
        ];
        for (path, expected) in test_cases {
            assert_eq!(mount.resolve(path), expected.map(PathBuf::from));
        }
    }

    #[test]
    fn test_resolve_root() {
        let mount = Mount::new("/", Root("/var/www".into())).unwrap();
        assert_eq!(
            mount.resolve("/index.html"),
            Some(PathBuf::from("/var/www/index.html"))
        );
    }

    #[tokio::test]
    async fn test_handle() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.svg"), "<svg/>").unwrap();

        let files = files::StaticFiles::new(dir.path()).unwrap();
        let fallback = Endpoint::sync(|_| "fallback");
        let mount = Mount::new("/static", files).unwrap().fallback(fallback);
        let default = Endpoint::default();

        let res = mount.handle(context("/static/img/a.svg"), &default).await;
        let res = res.unwrap();
        assert_eq!(res.body, b"<svg/>");
        assert_eq!(res.headers.get("content-type"), Some("image/svg+xml"));

        // Missing files and directories are handed to the fallback
        for path in ["/static/img/b.svg", "/static/img", "/static/../x"] {
            let res = mount.handle(context(path), &default).await.unwrap();
            assert_eq!(res.body, b"fallback");
            assert_eq!(
                res.headers.get("content-type"),
                Some("text/plain; charset=utf-8")
            );
        }
    }

    #[tokio::test]
    async fn test_handle_default() {
        let dir = tempfile::tempdir().unwrap();
        let files = files::StaticFiles::new(dir.path()).unwrap();
        let mount = Mount::new("/static", files).unwrap();
        let default = Endpoint::default();

        let res = mount.handle(context("/static/a"), &default).await.unwrap();
        assert_eq!(res.status, Status::NotFound);
    }
}
