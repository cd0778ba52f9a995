//! Request routing: map URL patterns and HTTP methods to handler functions.
//!
//! This module provides [`Router`], an ordered route table that dispatches
//! incoming requests by method and path. Patterns are `/`-separated segments
//! where a segment starting with `:` captures exactly one path segment:
//!
//! | Pattern        | Example match   | Captured params    |
//! |----------------|-----------------|--------------------|
//! | `/user-agent`  | `/user-agent`   | *(none)*           |
//! | `/echo/:name`  | `/echo/hello`   | `name → "hello"`   |
//!
//! Trailing slashes are normalized on both patterns and incoming paths, so
//! `/echo/hi/` and `/echo/hi` are treated as equivalent, and the empty path
//! matches `/`.
//!
//! Routes are matched in registration order; the first route whose method and
//! pattern both match wins, even when a later route is a closer fit. Register
//! literal routes before parameterized routes of the same shape.
//!
//! Prefixes passed to [`Router::deny_traversal`] answer `400` to any request
//! beneath them whose path has a `..` segment, before any route is tried.

use std::pin::Pin;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::context::{Context, PathParams};
use crate::{Method, Request, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`] and
/// returns a [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so the route table can be
/// shared across connection tasks without copying the closures. Use
/// [`Router::get`], [`Router::post`] or [`Router::add_route`] rather than
/// building one directly.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait via the blanket impl below.
/// Collaborators a handler needs (storage, settings) are captured by the
/// closure at registration time.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

// A single pattern segment, either a literal string or a named capture (`:name`).
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Parameter(String),
}

// Compiled representation of a route pattern string.
#[derive(Debug, Clone)]
struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    // Splits `pattern` once, at registration time.
    fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Parameter(name.to_owned()),
                None => Segment::Static(s.to_owned()),
            })
            .collect();
        Self { segments }
    }

    // Try to match pre-split path segments, returning the captures on success.
    fn matches(&self, path_segments: &[&str]) -> Option<PathParams> {
        if self.segments.len() != path_segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (seg, path_seg) in self.segments.iter().zip(path_segments) {
            match seg {
                Segment::Static(s) => {
                    if s != path_seg {
                        return None;
                    }
                }
                Segment::Parameter(name) => {
                    let value = percent_decode_str(path_seg).decode_utf8_lossy();
                    params.insert(name.as_str(), value.into_owned());
                }
            }
        }
        Some(params)
    }
}

// `/`-delimited pieces of `path` with empty entries dropped.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// A single registered route binding a method + pattern to a handler.
struct Route {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

/// The outcome of a successful [`Router::find`].
pub struct RouteMatch<'a> {
    pub handler: &'a Handler,
    pub params: PathParams,
}

/// HTTP request router that dispatches requests to registered handler functions.
///
/// Routes are evaluated in registration order; the first route whose HTTP
/// method and path pattern both match the incoming request is used. The table
/// is only mutated while building; wrap the finished router in an [`Arc`] to
/// share it between connections.
///
/// # Examples
///
/// ```rust,no_run
/// use barehttp::context::Context;
/// use barehttp::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
///
/// router.get("/", |_ctx: Context| async { Response::new(StatusCode::Ok) });
///
/// router.get("/echo/:name", |ctx: Context| async move {
///     let name = ctx.param("name").unwrap_or_default().to_owned();
///     Response::text(StatusCode::Ok, name)
/// });
/// ```
pub struct Router {
    routes: Vec<Route>,
    guarded_prefixes: Vec<Vec<String>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            guarded_prefixes: Vec::new(),
        }
    }

    /// Register a handler for `GET` requests matching `pattern`.
    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, pattern, handler);
    }

    /// Register a handler for `POST` requests matching `pattern`.
    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, pattern, handler);
    }

    /// Register a handler for `method` requests matching `pattern`.
    ///
    /// The pattern is split into segments here, once; requests only split
    /// their own path.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(pattern),
            handler,
        });
    }

    /// Reject requests under `prefix` whose path contains a `..` segment,
    /// literal or percent-encoded, with `400 Bad Request`.
    pub fn deny_traversal(&mut self, prefix: &str) {
        self.guarded_prefixes
            .push(split_path(prefix).map(str::to_owned).collect());
    }

    // Whether `path` falls under a prefix registered with `deny_traversal`.
    fn is_guarded(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = split_path(path).collect();
        self.guarded_prefixes.iter().any(|prefix| {
            prefix.len() <= path_segments.len()
                && prefix.iter().zip(&path_segments).all(|(p, s)| p == s)
        })
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// Returns `None` when no route matches; this is an ordinary outcome and
    /// callers answer it with a `404`.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let path_segments: Vec<&str> = split_path(path).collect();

        self.routes
            .iter()
            .filter(|route| &route.method == method)
            .find_map(|route| {
                route.pattern.matches(&path_segments).map(|params| RouteMatch {
                    handler: &route.handler,
                    params,
                })
            })
    }

    /// Dispatch `request` to the first matching route and return its response.
    ///
    /// When no route matches, a `404 Not Found` response naming the
    /// requested path is returned instead.
    pub async fn route(&self, request: Request) -> Response {
        if request.has_dot_dot_segment() && self.is_guarded(request.path()) {
            warn!(method = %request.method(), path = %request.path(), "rejecting dot-dot path");
            return Response::text(StatusCode::BadRequest, "path traversal is not allowed");
        }

        let Some(RouteMatch { handler, params }) = self.find(request.method(), request.path())
        else {
            debug!(method = %request.method(), path = %request.path(), "no route matched");
            return Response::text(
                StatusCode::NotFound,
                format!("the requested resource {} is not supported", request.path()),
            );
        };

        handler(Context::with_params(request, params)).await
    }
}
