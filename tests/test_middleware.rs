use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use wicket::http::handler::{boxed, BoxHandler, Handler, HandlerError, HandlerResult};
use wicket::http::middleware::{compose, Middleware, Recovery, RequestLogger};
use wicket::http::request::{Method, Request, RequestBuilder};
use wicket::http::response::{Response, StatusCode};

type Log = Arc<Mutex<Vec<String>>>;

fn request(path: &str) -> Request {
    RequestBuilder::new()
        .method(Method::GET)
        .path(path)
        .build()
        .unwrap()
}

fn layer<M: Middleware>(middleware: M) -> Arc<dyn Middleware> {
    Arc::new(middleware)
}

fn recording_layer(name: &'static str, log: Log) -> Arc<dyn Middleware> {
    Arc::new(move |next: BoxHandler| -> BoxHandler {
        let log = log.clone();
        boxed(move |req: Request| {
            let next = next.clone();
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{name} in"));
                let result = next.call(req).await;
                log.lock().unwrap().push(format!("{name} out"));
                result
            }
        })
    })
}

async fn explode(_req: Request) -> HandlerResult {
    panic!("boom")
}

async fn fail(_req: Request) -> HandlerResult {
    Err(HandlerError::new("database unavailable"))
}

struct PanicsBeforeFuture;

impl Handler for PanicsBeforeFuture {
    fn call(&self, _req: Request) -> BoxFuture<'static, HandlerResult> {
        panic!("eager")
    }
}

#[tokio::test]
async fn test_first_middleware_is_outermost() {
    let log: Log = Arc::default();

    let handler = {
        let log = log.clone();
        boxed(move |_req: Request| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push("H".to_string());
                Ok::<_, HandlerError>(Response::ok("done"))
            }
        })
    };

    let chain = compose(
        &[
            recording_layer("A", log.clone()),
            recording_layer("B", log.clone()),
        ],
        handler,
    );

    let response = chain.call(request("/")).await.unwrap();
    assert_eq!(response.body(), b"done");

    assert_eq!(
        *log.lock().unwrap(),
        vec!["A in", "B in", "H", "B out", "A out"]
    );
}

#[tokio::test]
async fn test_compose_with_no_middleware_is_identity() {
    let handler = boxed(|_req: Request| async { Ok::<_, HandlerError>(Response::ok("plain")) });

    let chain = compose(&[], handler);

    assert_eq!(chain.call(request("/")).await.unwrap().body(), b"plain");
}

#[tokio::test]
async fn test_recovery_turns_panic_into_500() {
    let chain = compose(&[layer(Recovery)], boxed(explode));

    let response = chain.call(request("/explode")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body().is_empty());
}

#[tokio::test]
async fn test_recovery_catches_panic_while_building_future() {
    let chain = compose(&[layer(Recovery)], boxed(PanicsBeforeFuture));

    let response = chain.call(request("/eager")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_recovery_turns_handler_error_into_500() {
    let chain = compose(&[layer(Recovery)], boxed(fail));

    let response = chain.call(request("/fail")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), b"Internal Server Error");
}

#[tokio::test]
async fn test_recovery_leaves_success_untouched() {
    let handler = boxed(|_req: Request| async {
        Ok::<_, HandlerError>(Response::text(StatusCode::CREATED, "made"))
    });
    let chain = compose(&[layer(Recovery)], handler);

    let response = chain.call(request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body(), b"made");
}

#[tokio::test]
async fn test_logger_outside_recovery_sees_500() {
    let log: Log = Arc::default();
    let chain = compose(
        &[
            layer(RequestLogger),
            recording_layer("outer", log.clone()),
            layer(Recovery),
        ],
        boxed(explode),
    );

    let response = chain.call(request("/explode")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(*log.lock().unwrap(), vec!["outer in", "outer out"]);
}

#[tokio::test]
async fn test_logger_passes_error_through() {
    let chain = compose(&[layer(RequestLogger)], boxed(fail));

    let result = chain.call(request("/fail")).await;

    assert!(result.is_err());
}
