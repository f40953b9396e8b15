use wicket::http::headers::Headers;
use wicket::http::request::{Method, Request, RequestBuilder};

fn request_with(headers: Headers) -> Request {
    Request {
        method: Method::POST,
        path: "/api".to_string(),
        version: "HTTP/1.1".to_string(),
        headers,
        body: Default::default(),
    }
}

#[test]
fn test_request_header_retrieval() {
    let headers: Headers = [("Host", "example.com"), ("Content-Type", "application/json")]
        .into_iter()
        .collect();
    let req = request_with(headers);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let req = request_with([("Content-Length", "42")].into_iter().collect());
    assert_eq!(req.content_length(), Some(42));
}

#[test]
fn test_request_content_length_missing_or_invalid() {
    assert_eq!(request_with(Headers::new()).content_length(), None);

    let req = request_with([("Content-Length", "not-a-number")].into_iter().collect());
    assert_eq!(req.content_length(), None);

    let req = request_with([("Content-Length", "-1")].into_iter().collect());
    assert_eq!(req.content_length(), None);
}

#[test]
fn test_request_method_parse() {
    assert_eq!(Method::parse("GET"), Some(Method::GET));
    assert_eq!(Method::parse("POST"), Some(Method::POST));
    assert_eq!(Method::parse("PURGE"), Some(Method::Extension("PURGE".to_string())));
    assert_eq!(Method::parse("get"), None); // Case-sensitive
    assert_eq!(Method::parse("GE T"), None);
    assert_eq!(Method::parse(""), None);
}

#[test]
fn test_method_display_round_trips_token() {
    assert_eq!(Method::DELETE.to_string(), "DELETE");
    assert_eq!(Method::Extension("PURGE".into()).as_str(), "PURGE");
}

#[test]
fn test_request_builder() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/submit")
        .header("Content-Type", "text/plain")
        .body("x=1")
        .build()
        .unwrap();

    assert_eq!(req.version, "HTTP/1.1");
    assert_eq!(req.header("Content-Type"), Some("text/plain"));
    assert_eq!(req.body_lossy(), "x=1");
}

#[test]
fn test_request_builder_requires_absolute_path() {
    let missing = RequestBuilder::new().method(Method::GET).build();
    assert!(missing.is_err());

    let relative = RequestBuilder::new().method(Method::GET).path("hello").build();
    assert!(relative.is_err());
}
