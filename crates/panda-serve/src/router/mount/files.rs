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

//! Static files.

use httpdate::fmt_http_date;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::handler::{self, Context, Endpoint};
use crate::http::response::{guess_media_type, Kind};
use crate::http::{Header, Response, Status};
use crate::router::error::{Error, Result};

use super::Prefix;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Static files.
///
/// Serves files from a directory on disk, and is usually the target of a
/// [`Mount`][]. The directory is canonicalized on creation, and resolved
/// files must stay inside of it after symbolic links are followed.
///
/// [`Mount`]: crate::router::Mount
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::router::StaticFiles;
///
/// // Create static files
/// let files = StaticFiles::new(".")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StaticFiles {
    /// Canonical directory.
    root: PathBuf,
}

/// File read from disk.
struct File {
    /// File content.
    bytes: Vec<u8>,
    /// Last modification time.
    modified: Option<SystemTime>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl StaticFiles {
    /// Creates static files served from the given directory.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Directory`], if the path doesn't point to
    /// a directory, and [`Error::Io`] if it can't be canonicalized.
    pub fn new<P>(root: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::Directory(root.to_path_buf()));
        }

        // Return static files
        Ok(Self { root: root.canonicalize()? })
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Prefix for StaticFiles {
    #[inline]
    fn prefix(&self) -> &Path {
        &self.root
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Creates an endpoint that always serves the given file.
///
/// This is useful as the fallback of a [`Mount`][], e.g., to serve the entry
/// point of a single page application for all unknown paths. If the file
/// disappears after creation, the endpoint replies with `404`.
///
/// [`Mount`]: crate::router::Mount
///
/// # Errors
///
/// This function returns [`Error::File`], if the path doesn't point to a file.
pub fn serve_file<P>(path: P) -> Result<Endpoint>
where
    P: Into<PathBuf>,
{
    let path = path.into();
    if !path.is_file() {
        return Err(Error::File(path));
    }

    // Return endpoint
    Ok(Endpoint::future(move |ctx| {
        let path = path.clone();
        async move {
            let res = serve(&ctx, path, None).await?;
            handler::Result::Ok(
                res.unwrap_or_else(|| Response::from_status(Status::NotFound)),
            )
        }
    }))
}

/// Serves the file at the given path, if it exists.
///
/// The file is read on the worker pool. If a root is given, the file is only
/// served if its canonical path is inside the canonical root. The response
/// carries the media type guessed from the path, the response headers of the
/// context, and the time of last modification.
pub(crate) async fn serve(
    ctx: &Context, path: PathBuf, root: Option<PathBuf>,
) -> handler::Result<Option<Response>> {
    let media_type = guess_media_type(&path);
    let file = ctx
        .pool()
        .spawn(move || read(&path, root.as_deref()))
        .await??;

    // Return response, if the file exists
    Ok(file.map(|file| {
        let mut builder = Response::builder(Kind::Binary)
            .media_type(media_type)
            .headers(&ctx.headers);
        if let Some(modified) = file.modified {
            let value = fmt_http_date(modified);
            builder = builder.header(Header::LastModified, value);
        }
        builder.content(file.bytes)
    }))
}

/// Reads the file at the given path, if it's a regular file inside the root.
fn read(path: &Path, root: Option<&Path>) -> io::Result<Option<File>> {
    let path = match path.canonicalize() {
        Ok(path) => path,
        Err(err) if is_missing(&err) => return Ok(None),
        Err(err) => return Err(err),
    };

    // Symbolic links might point outside of the root
    if let Some(root) = root {
        if !path.starts_with(root.canonicalize()?) {
            debug!(path = %path.display(), "file outside of root");
            return Ok(None);
        }
    }

    // Directories and other special files are treated as missing
    let metadata = fs::metadata(&path)?;
    if !metadata.is_file() {
        return Ok(None);
    }

    // Return file
    Ok(Some(File {
        bytes: fs::read(&path)?,
        modified: metadata.modified().ok(),
    }))
}

/// Returns whether the given error denotes a missing file.
fn is_missing(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::http::Request;
    use crate::pool::Pool;

    use super::*;

    fn context() -> Context {
        Context::new(Request::new(), Pool::new(1).unwrap())
    }

    #[test]
    fn test_new() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let files = StaticFiles::new(dir.path()).unwrap();
        assert_eq!(files.prefix(), dir.path().canonicalize().unwrap());
        assert!(matches!(StaticFiles::new(&file), Err(Error::Directory(_))));
    }

    #[tokio::test]
    async fn test_serve() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("style.css");
        fs::write(&file, "body {}").unwrap();

        let mut ctx = context();
        ctx.headers.insert("Cache-Control", "no-cache");
        let res = serve(&ctx, file, None).await.unwrap().unwrap();
        assert_eq!(res.status, Status::Ok);
        assert_eq!(res.body, b"body {}");
        assert_eq!(
            res.headers.get(Header::ContentType),
            Some("text/css; charset=utf-8")
        );
        assert_eq!(res.headers.get(Header::ContentLength), Some("7"));
        assert_eq!(res.headers.get(Header::CacheControl), Some("no-cache"));
        assert!(res.headers.contains(Header::LastModified));
    }

    #[tokio::test]
    async fn test_serve_missing() {
        let dir = tempfile::tempdir().unwrap();
        let test_cases = vec![
            dir.path().join("missing.txt"),
            dir.path().join("missing/a.txt"),
            dir.path().to_path_buf(),
        ];
        for path in test_cases {
            let res = serve(&context(), path, None).await.unwrap();
            assert!(res.is_none());
        }
    }

    #[tokio::test]
    async fn test_serve_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        fs::create_dir(&root).unwrap();
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        let path = root.join("../secret.txt");
        let res = serve(&context(), path.clone(), Some(root)).await.unwrap();
        assert!(res.is_none());
        let res = serve(&context(), path, None).await.unwrap();
        assert!(res.is_some());
    }

    #[tokio::test]
    async fn test_serve_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "<h1>App</h1>").unwrap();

        let endpoint = serve_file(&file).unwrap();
        let res = endpoint.respond(context(), Kind::Json).await.unwrap();
        assert_eq!(res.body, b"<h1>App</h1>");

        // Missing files are answered with 404
        fs::remove_file(&file).unwrap();
        let res = endpoint.respond(context(), Kind::Json).await.unwrap();
        assert_eq!(res.status, Status::NotFound);
        assert!(matches!(serve_file(&file), Err(Error::File(_))));
    }
}
