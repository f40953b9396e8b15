//! Application routes served by the `wicket` binary.

use std::sync::Arc;

use crate::http::handler::{boxed, BoxHandler, HandlerResult};
use crate::http::middleware::{compose, Middleware, Recovery, RequestLogger};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::router::Router;

pub fn router() -> Router {
    Router::new()
        .get("/", index)
        .get("/hello", hello)
        .post("/submit", submit)
}

/// The router wrapped in logging (outermost) and recovery.
pub fn service(router: Router) -> BoxHandler {
    let middleware: [Arc<dyn Middleware>; 2] = [Arc::new(RequestLogger), Arc::new(Recovery)];
    compose(&middleware, boxed(router))
}

async fn index(_req: Request) -> HandlerResult {
    Ok(Response::text(StatusCode::OK, "Welcome to my Rust server!\n"))
}

async fn hello(_req: Request) -> HandlerResult {
    Ok(Response::text(StatusCode::OK, "Hello\n"))
}

/// Acknowledges the payload by echoing it back.
async fn submit(req: Request) -> HandlerResult {
    let mut response = Response::text(StatusCode::CREATED, "Recieved: ");
    response.append_body(&req.body);
    response.append_body("\n");
    Ok(response)
}
