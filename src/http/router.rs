use std::collections::HashMap;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::http::handler::{BoxHandler, Handler, HandlerResult};
use crate::http::request::{Method, Request};
use crate::http::response::Response;

/// Outcome of a route lookup.
pub enum Dispatch<'a> {
    /// A handler is registered for the method and exact path.
    Matched(&'a BoxHandler),
    /// The method has routes, but not this path.
    NotFound,
    /// No route exists for the method at all.
    MethodNotSupported,
}

/// Method + exact path route table.
///
/// Filled before the server starts and read-only afterwards, so lookups
/// need no locking. Paths match by string equality only.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, HashMap<String, BoxHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a handler. Registering the same method and path again
    /// replaces the earlier handler.
    pub fn register<H: Handler>(&mut self, method: Method, path: impl Into<String>, handler: H) {
        let path = path.into();
        let replaced = self
            .routes
            .entry(method.clone())
            .or_default()
            .insert(path.clone(), crate::http::handler::boxed(handler))
            .is_some();

        if replaced {
            tracing::debug!(method = %method, path = %path, "Route handler replaced");
        }
    }

    /// Chainable form of [`Router::register`].
    pub fn route<H: Handler>(mut self, method: Method, path: impl Into<String>, handler: H) -> Self {
        self.register(method, path, handler);
        self
    }

    pub fn get<H: Handler>(self, path: impl Into<String>, handler: H) -> Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H: Handler>(self, path: impl Into<String>, handler: H) -> Self {
        self.route(Method::POST, path, handler)
    }

    pub fn dispatch(&self, method: &Method, path: &str) -> Dispatch<'_> {
        match self.routes.get(method) {
            Some(paths) => match paths.get(path) {
                Some(handler) => Dispatch::Matched(handler),
                None => Dispatch::NotFound,
            },
            None => Dispatch::MethodNotSupported,
        }
    }

    /// Number of registered (method, path) pairs.
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Handler for Router {
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult> {
        let handler = match self.dispatch(&req.method, &req.path) {
            Dispatch::Matched(handler) => handler.clone(),
            Dispatch::NotFound => return future::ready(Ok(Response::not_found())).boxed(),
            Dispatch::MethodNotSupported => {
                return future::ready(Ok(Response::method_not_allowed())).boxed();
            }
        };

        handler.call(req)
    }
}
