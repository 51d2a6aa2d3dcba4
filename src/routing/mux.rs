//! Router wrapper with a queryable not-found handler.
//!
//! # Responsibilities
//! - Wrap an `axum::Router` so route registration stays ergonomic
//! - Hold the not-found handler in a shared cell that handlers can call
//! - Install that same cell as the router fallback
//!
//! # Design Decisions
//! - axum does not let a handler reach the router's fallback, so the
//!   fallback lives here and the router delegates to it
//! - The cell is read on every miss and swapped on configuration, which is
//!   the access pattern `ArcSwap` is built for
//! - Installing a not-found handler after mounting routes still affects
//!   those routes, since the handler is looked up per request
//! - Registered paths are remembered so mounts can refuse a path that is
//!   already taken instead of tripping axum's overlap panic

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    handler::Handler,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use futures_util::future::BoxFuture;
use tower::util::BoxCloneSyncService;
use tower::{service_fn, Service, ServiceExt};

/// Type-erased not-found service.
pub type NotFoundService = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Shared handle to a router's not-found handler.
#[derive(Clone)]
pub struct NotFound {
    current: Arc<ArcSwap<NotFoundService>>,
}

impl NotFound {
    fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(default_not_found())),
        }
    }

    /// Replace the handler for every holder of this handle.
    pub fn set(&self, service: NotFoundService) {
        self.current.store(Arc::new(service));
    }

    /// Answer `req` with the currently installed not-found handler.
    pub async fn respond(&self, req: Request<Body>) -> Response {
        let service = self.current.load_full().as_ref().clone();
        match service.oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

// Lets `ServeDir` fall back to the same handler as the router.
impl Service<Request<Body>> for NotFound {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let not_found = self.clone();
        Box::pin(async move { Ok(not_found.respond(req).await) })
    }
}

impl std::fmt::Debug for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotFound").finish_non_exhaustive()
    }
}

fn default_not_found() -> NotFoundService {
    BoxCloneSyncService::new(service_fn(|_req: Request<Body>| async {
        Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response())
    }))
}

/// A router that exposes its not-found handler to the routes it carries.
pub struct Mux<S = ()> {
    router: Router<S>,
    not_found: NotFound,
    paths: HashSet<String>,
}

impl<S> Mux<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create an empty router answering `404` with an empty body on misses.
    pub fn new() -> Self {
        let not_found = NotFound::new();
        let fallback = not_found.clone();
        let router = Router::new().fallback(move |req: Request<Body>| async move {
            fallback.respond(req).await
        });

        Self {
            router,
            not_found,
            paths: HashSet::new(),
        }
    }

    /// Register `method_router` at `path`.
    ///
    /// Panics if `path` is already registered, as `axum::Router::route` does.
    pub fn route(mut self, path: &str, method_router: MethodRouter<S>) -> Self {
        self.router = self.router.route(path, method_router);
        self.paths.insert(path.to_owned());
        self
    }

    /// Whether a route was registered at exactly `path`.
    pub fn has_route(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Install a handler for requests nothing else answers.
    pub fn not_found<H, T>(self, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.not_found_service(handler.with_state(()))
    }

    /// Install a service for requests nothing else answers.
    pub fn not_found_service<Svc, R>(self, service: Svc) -> Self
    where
        Svc: Service<Request<Body>, Response = R, Error = Infallible> + Clone + Send + Sync + 'static,
        Svc::Future: Send + 'static,
        R: IntoResponse + 'static,
    {
        self.not_found
            .set(BoxCloneSyncService::new(service.map_response(IntoResponse::into_response)));
        self
    }

    /// Handle to the not-found handler, resolved per request.
    pub fn not_found_handle(&self) -> NotFound {
        self.not_found.clone()
    }

    /// Finish registration and hand back the underlying router.
    pub fn into_router(self) -> Router<S> {
        self.router
    }
}

impl<S> Default for Mux<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for Mux<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mux").finish_non_exhaustive()
    }
}
