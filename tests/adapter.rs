use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_LENGTH, header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use webplan::{
    ApiError, AppConfig, AppState, Database, HandlerResult, Kwargs, Payload, RouteTable, Signature,
};

async fn index(_state: AppState, kw: Kwargs) -> HandlerResult {
    let path = kw.request().map(|r| r.path().to_string()).unwrap_or_default();
    Ok(Payload::Html(format!("<h1>index {}</h1>", path)))
}

async fn greeting(_state: AppState, mut kw: Kwargs) -> HandlerResult {
    let name: String = kw.require("name")?;
    let has_request = kw.request().is_some();
    Ok(Payload::Json(json!({ "name": name, "request": has_request })))
}

async fn hello(_state: AppState, kw: Kwargs) -> HandlerResult {
    Ok(Payload::Json(Value::Object(kw.into_values())))
}

async fn echo(_state: AppState, kw: Kwargs) -> HandlerResult {
    Ok(Payload::Json(Value::Object(kw.into_values())))
}

async fn missing(_state: AppState, _kw: Kwargs) -> HandlerResult {
    Err(ApiError::not_found("blog", "blog 42 does not exist").into())
}

webplan::route!(GET "/", index, Signature::new().request());
webplan::route!(GET "/greeting/{name}", greeting, Signature::new().keyword("name").keyword("request"));
webplan::route!(GET "/hello", hello, Signature::new().keyword("name").optional("lang"));
webplan::route!(POST "/echo", echo, Signature::new().var_keyword("kw"));
webplan::route!(POST "/hello", hello, Signature::new().keyword("name"));
webplan::route!(GET "/blogs/{id}", missing, Signature::new().keyword("id"));

fn app_with(config: AppConfig) -> Router {
    let db = Database::connect_lazy(&config.db);
    let table = RouteTable::scan(module_path!()).expect("handlers register");
    table.into_router(AppState::new(db, config))
}

fn app() -> Router {
    app_with(AppConfig::default())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut b = Request::post(uri);
    if let Some(ct) = content_type {
        b = b.header(CONTENT_TYPE, ct);
    }
    b.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn scan_finds_every_declared_handler() {
    let table = RouteTable::scan(module_path!()).unwrap();
    assert_eq!(table.entries().len(), 6);
    assert!(RouteTable::scan("some::other::module").unwrap().entries().is_empty());
}

#[tokio::test]
async fn request_only_handler_gets_request_object() {
    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("<h1>index /</h1>".into()));
}

#[tokio::test]
async fn missing_required_keyword_is_bad_request() {
    let (status, body) = send(app(), get("/hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "bad request: Missing argument: name");
}

#[tokio::test]
async fn query_string_supplies_keywords() {
    let (status, body) = send(app(), get("/hello?name=Ruhua&ignored=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Ruhua" }));
}

#[tokio::test]
async fn path_segment_beats_query_value() {
    let (status, body) = send(app(), get("/greeting/Alice?name=Bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Alice", "request": true }));
}

#[tokio::test]
async fn json_body_feeds_arbitrary_keywords() {
    let (status, body) = send(app(), post("/echo", Some("application/json"), r#"{"name": "x", "n": 2}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "x", "n": 2 }));
}

#[tokio::test]
async fn declared_keywords_prune_json_body() {
    let (status, body) = send(
        app(),
        post("/hello", Some("application/json; charset=utf-8"), r#"{"name": "x", "admin": true}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "x" }));
}

#[tokio::test]
async fn form_body_keeps_first_value() {
    let (status, body) = send(
        app(),
        post("/echo", Some("application/x-www-form-urlencoded"), "name=x&name=y&lang=en"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "x", "lang": "en" }));
}

#[tokio::test]
async fn multipart_fields_are_keywords() {
    let body = "--XyZ\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nmulti\r\n--XyZ--\r\n";
    let (status, body) = send(app(), post("/echo", Some("multipart/form-data; boundary=XyZ"), body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "multi" }));
}

#[tokio::test]
async fn unusable_bodies_are_bad_requests() {
    for (ct, body) in [
        (Some("application/xml"), "<name>x</name>"),
        (None, r#"{"name": "x"}"#),
        (Some("application/json"), "[1, 2]"),
        (Some("application/json"), "{not json"),
    ] {
        let (status, _) = send(app(), post("/echo", ct, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "content type {:?}", ct);
    }
}

#[tokio::test]
async fn application_error_becomes_structured_payload() {
    let (status, body) = send(app(), get("/blogs/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "error": "Value : Not Found", "data": "blog", "message": "blog 42 does not exist" })
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 16;
    let payload = json!({ "name": "x".repeat(64) }).to_string();
    let req = Request::post("/echo")
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = send(app_with(config), req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn oversized_body_without_length_header_is_rejected_the_same_way() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 16;
    let payload = json!({ "name": "x".repeat(64) }).to_string();
    for ct in ["application/json", "application/x-www-form-urlencoded"] {
        let req = post("/echo", Some(ct), &payload);
        assert!(req.headers().get(CONTENT_LENGTH).is_none());
        let (status, body) = send(app_with(config.clone()), req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "content type {}", ct);
        assert_eq!(body["error"]["code"], "payload_too_large");
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = send(app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
