//! Handler middleware.
//!
//! A middleware turns one handler into another. [`compose`] applies a list
//! so that the first entry is the outermost wrapper:
//!
//! ```text
//! compose([A, B], H)  ==  A(B(H))
//!
//! in:  A → B → H
//! out: H → B → A
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};

use crate::http::handler::{boxed, BoxHandler, Handler, HandlerResult};
use crate::http::request::Request;
use crate::http::response::Response;

pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        (self)(next)
    }
}

/// Folds `middleware` right to left over `handler`.
pub fn compose(middleware: &[Arc<dyn Middleware>], handler: BoxHandler) -> BoxHandler {
    middleware
        .iter()
        .rev()
        .fold(handler, |next, layer| layer.wrap(next))
}

// ─── Recovery ───────────────────────────────────────────────────────────────

/// Turns handler faults into 500 responses.
///
/// Both a panic inside the wrapped handler and an `Err` outcome are caught
/// here, logged with the request method and path, and replaced by a static
/// `Internal Server Error` body. The connection then closes normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Middleware for Recovery {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        boxed(RecoveryHandler { inner: next })
    }
}

struct RecoveryHandler {
    inner: BoxHandler,
}

impl Handler for RecoveryHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult> {
        let method = req.method.clone();
        let path = req.path.clone();

        // Building the future runs handler code too.
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(req))) {
            Ok(fut) => fut,
            Err(payload) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    panic = %panic_message(payload.as_ref()),
                    "Handler panicked"
                );
                return futures_util::future::ready(Ok(Response::internal_error())).boxed();
            }
        };

        async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(err)) => {
                    tracing::error!(
                        method = %method,
                        path = %path,
                        error = %err,
                        "Handler failed"
                    );
                    Ok(Response::internal_error())
                }
                Err(payload) => {
                    tracing::error!(
                        method = %method,
                        path = %path,
                        panic = %panic_message(payload.as_ref()),
                        "Handler panicked"
                    );
                    Ok(Response::internal_error())
                }
            }
        }
        .boxed()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

// ─── RequestLogger ──────────────────────────────────────────────────────────

/// Logs method, path, final status and elapsed time of every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        boxed(LoggingHandler { inner: next })
    }
}

struct LoggingHandler {
    inner: BoxHandler,
}

impl Handler for LoggingHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult> {
        let method = req.method.clone();
        let path = req.path.clone();
        let start = Instant::now();
        let fut = self.inner.call(req);

        async move {
            let result = fut.await;
            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(_) => 500,
            };

            tracing::info!(
                method = %method,
                path = %path,
                status,
                elapsed = ?start.elapsed(),
                "Request handled"
            );

            result
        }
        .boxed()
    }
}
