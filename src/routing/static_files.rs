//! Static file routes.
//!
//! # Responsibilities
//! - Validate the route pattern when the route is declared
//! - Redirect `pattern` to `pattern/` when the pattern lacks the slash
//! - Check the file exists before handing the request to `ServeDir`
//! - Route misses to the router's not-found handler, including misses
//!   `ServeDir` finds itself (a directory with no `index.html`)
//!
//! # Design Decisions
//! - Validation happens in `FileRouteConfig::new`, so an invalid pattern
//!   never reaches the router
//! - The existence check resolves the path the same way `ServeDir` does
//!   (prefix stripped, percent-decoded, no `..` segments)
//! - Directories requested without a trailing slash get a `301` to the
//!   prefixed path, since `ServeDir` only sees the stripped path

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::routing::mux::{Mux, NotFound};

/// Characters the router reserves for parameters and wildcards.
const RESERVED: &[char] = &['{', '}', '*'];

/// Error raised when a static route is declared with an unusable pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("file server route {0:?} does not permit URL parameters")]
    UrlParameters(String),

    #[error("file server route {0:?} must start with '/'")]
    NotAbsolute(String),

    #[error("path {0:?} is already routed")]
    Duplicate(String),
}

/// A URL prefix bound to a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRouteConfig {
    pattern: String,
    root: PathBuf,
}

impl FileRouteConfig {
    /// Validate `pattern` and bind it to `root`.
    pub fn new(pattern: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self, RouteError> {
        let pattern = pattern.into();

        if pattern.contains(RESERVED) || pattern.split('/').any(|s| s.starts_with(':')) {
            return Err(RouteError::UrlParameters(pattern));
        }
        if !pattern.starts_with('/') {
            return Err(RouteError::NotAbsolute(pattern));
        }

        Ok(Self {
            pattern,
            root: root.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The prefix files are served under, always ending in `/`.
    pub fn prefix(&self) -> String {
        if self.needs_redirect() {
            format!("{}/", self.pattern)
        } else {
            self.pattern.clone()
        }
    }

    fn needs_redirect(&self) -> bool {
        self.pattern != "/" && !self.pattern.ends_with('/')
    }

    /// Register the redirect (if any) and the file handler on `mux`.
    ///
    /// Fails if the pattern, the prefix or the prefix wildcard is already routed.
    pub fn mount<S>(&self, mux: Mux<S>) -> Result<Mux<S>, RouteError>
    where
        S: Clone + Send + Sync + 'static,
    {
        let prefix = self.prefix();
        let wildcard = format!("{prefix}{{*path}}");

        let redirect = self.needs_redirect().then_some(self.pattern.as_str());
        for path in redirect.into_iter().chain([prefix.as_str(), wildcard.as_str()]) {
            if mux.has_route(path) {
                return Err(RouteError::Duplicate(path.to_owned()));
            }
        }

        let mut mux = mux;

        if self.needs_redirect() {
            let location = prefix.clone();
            mux = mux.route(
                &self.pattern,
                get(move || async move { moved_permanently(&location) }),
            );
        }

        let not_found = mux.not_found_handle();
        let files = StaticFiles {
            prefix: prefix.clone(),
            root: self.root.clone(),
            serve_dir: ServeDir::new(&self.root).fallback(not_found.clone()),
            not_found,
        };
        let handler = get(move |req: Request<Body>| async move { files.serve(req).await });

        tracing::debug!(
            prefix = %prefix,
            root = %self.root.display(),
            "Static route registered"
        );

        Ok(mux.route(&prefix, handler.clone()).route(&wildcard, handler))
    }
}

impl<S> Mux<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Serve the files under `root` at `pattern`.
    pub fn file_server(
        self,
        pattern: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Result<Self, RouteError> {
        FileRouteConfig::new(pattern, root)?.mount(self)
    }
}

/// Per-route handler state.
#[derive(Clone)]
struct StaticFiles {
    prefix: String,
    root: PathBuf,
    serve_dir: ServeDir<NotFound>,
    not_found: NotFound,
}

impl StaticFiles {
    async fn serve(self, req: Request<Body>) -> Response {
        let path = req.uri().path().to_owned();
        let rest = path.strip_prefix(self.prefix.as_str()).unwrap_or("");

        let Some(candidate) = resolve(&self.root, rest) else {
            return self.not_found.respond(req).await;
        };

        let is_dir = match tokio::fs::metadata(&candidate).await {
            Ok(meta) => meta.is_dir(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::trace!(path = %candidate.display(), "Static file missing");
                return self.not_found.respond(req).await;
            }
            // Anything else is ServeDir's call.
            Err(_) => false,
        };

        if is_dir && !path.ends_with('/') {
            return moved_permanently(&format!("{path}/"));
        }

        let (mut parts, body) = req.into_parts();
        let stripped = match parts.uri.query() {
            Some(query) => format!("/{rest}?{query}"),
            None => format!("/{rest}"),
        };
        parts.uri = match stripped.parse::<Uri>() {
            Ok(uri) => uri,
            Err(_) => return self.not_found.respond(Request::from_parts(parts, body)).await,
        };

        match self.serve_dir.oneshot(Request::from_parts(parts, body)).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        }
    }
}

/// Map the part of the request path below the prefix onto `root`.
///
/// Returns `None` for paths that are not valid UTF-8 after decoding or that
/// try to leave `root`.
fn resolve(root: &Path, rest: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(rest).decode_utf8().ok()?;
    let mut path = root.to_path_buf();

    for segment in decoded.split('/') {
        if segment.contains('\\') {
            return None;
        }
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
    }

    Some(path)
}

fn moved_permanently(location: &str) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location.to_owned())]).into_response()
}
