use wicket::http::handler::{Handler, HandlerError, HandlerResult};
use wicket::http::request::{Method, Request, RequestBuilder};
use wicket::http::response::{Response, StatusCode};
use wicket::http::router::{Dispatch, Router};

fn request(method: Method, path: &str) -> Request {
    RequestBuilder::new().method(method).path(path).build().unwrap()
}

async fn first(_req: Request) -> HandlerResult {
    Ok(Response::ok("first"))
}

async fn second(_req: Request) -> HandlerResult {
    Ok(Response::ok("second"))
}

#[tokio::test]
async fn test_last_registration_wins() {
    let mut router = Router::new();
    router.register(Method::GET, "/dup", first);
    router.register(Method::GET, "/dup", second);

    assert_eq!(router.len(), 1);

    let Dispatch::Matched(handler) = router.dispatch(&Method::GET, "/dup") else {
        panic!("expected a matched route");
    };
    let response = handler.call(request(Method::GET, "/dup")).await.unwrap();
    assert_eq!(response.body(), b"second");
}

#[test]
fn test_unknown_path_under_known_method_is_not_found() {
    let router = Router::new().get("/hello", first);

    assert!(matches!(
        router.dispatch(&Method::GET, "/nope"),
        Dispatch::NotFound
    ));
}

#[test]
fn test_unknown_method_is_not_supported() {
    let router = Router::new().get("/hello", first);

    assert!(matches!(
        router.dispatch(&Method::DELETE, "/hello"),
        Dispatch::MethodNotSupported
    ));
    assert!(matches!(
        router.dispatch(&Method::Extension("BREW".into()), "/hello"),
        Dispatch::MethodNotSupported
    ));
}

#[test]
fn test_matching_is_exact() {
    let router = Router::new().get("/hello", first);

    assert!(matches!(router.dispatch(&Method::GET, "/hello"), Dispatch::Matched(_)));
    assert!(matches!(router.dispatch(&Method::GET, "/hello/"), Dispatch::NotFound));
    assert!(matches!(router.dispatch(&Method::GET, "/hell"), Dispatch::NotFound));
    assert!(matches!(router.dispatch(&Method::GET, "/HELLO"), Dispatch::NotFound));
    assert!(matches!(router.dispatch(&Method::GET, "/hello?x=1"), Dispatch::NotFound));
}

#[tokio::test]
async fn test_router_as_handler_maps_misses_to_status() {
    let router = Router::new().get("/hello", first).post("/submit", second);

    let ok = router.call(request(Method::GET, "/hello")).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let missing = router.call(request(Method::GET, "/missing")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let unsupported = router.call(request(Method::PUT, "/hello")).await.unwrap();
    assert_eq!(unsupported.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_closure_handlers_can_read_request() {
    let router = Router::new().post("/echo", |req: Request| async move {
        Ok::<_, HandlerError>(Response::text(StatusCode::OK, req.body_lossy().to_uppercase()))
    });

    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/echo")
        .body("shout")
        .build()
        .unwrap();

    let response = router.call(req).await.unwrap();
    assert_eq!(response.body(), b"SHOUT");
}
