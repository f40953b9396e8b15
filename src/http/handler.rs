//! Request handler contract.
//!
//! A handler takes ownership of the parsed [`Request`] and resolves to a
//! [`Response`] or a [`HandlerError`]. Async closures implement [`Handler`]
//! directly, so routes can be registered without naming a type:
//!
//! ```ignore
//! router.register(Method::GET, "/ping", |_req: Request| async {
//!     Ok::<_, HandlerError>(Response::ok("pong"))
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::http::request::Request;
use crate::http::response::Response;

/// Failure reported by a handler instead of a response.
///
/// The client only ever sees a 500; the message goes to the log.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self(format!("{err:#}"))
    }
}

pub type HandlerResult = Result<Response, HandlerError>;

pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult>;
}

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult> {
        (self)(req).boxed()
    }
}

/// Erases a handler into a [`BoxHandler`].
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}
