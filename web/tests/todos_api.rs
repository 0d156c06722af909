//! End-to-end tests of the HTTP API over the in-memory repository.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use todokv_core::{Context, TodoRepository};
use todokv_testing::{FixedIdGenerator, InMemoryTodoRepository, SequentialIdGenerator, todo};
use todokv_web::{AppState, REQUEST_ID_HEADER, router};
use tower::ServiceExt;

fn app() -> Router {
    router(AppState::new(
        InMemoryTodoRepository::new(),
        SequentialIdGenerator::default(),
    ))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

#[tokio::test]
async fn test_crud_flow() {
    let app = router(AppState::new(
        InMemoryTodoRepository::new(),
        FixedIdGenerator::new("id-1"),
    ));

    let response = send(&app, Method::POST, "/todos", Some(json!({"title": "buy milk"}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!({"id": "id-1", "title": "buy milk", "completed": false})
    );

    let response = send(&app, Method::GET, "/todos/id-1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "buy milk");

    let response = send(
        &app,
        Method::PUT,
        "/todos/id-1",
        Some(json!({"title": "buy milk and eggs", "completed": true})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"id": "id-1", "title": "buy milk and eggs", "completed": true})
    );

    let response = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([{"id": "id-1", "title": "buy milk and eggs", "completed": true}])
    );

    let response = send(&app, Method::DELETE, "/todos/id-1", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, "/todos/id-1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"code": "NOT_FOUND", "message": "not found"})
    );
}

#[tokio::test]
async fn test_empty_list_is_empty_array() {
    let response = send(&app(), Method::GET, "/todos", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_invalid_title_is_bad_request() {
    let app = app();
    let long = "a".repeat(201);
    for title in ["", "   ", long.as_str()] {
        let response = send(&app, Method::POST, "/todos", Some(json!({"title": title}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "title {title:?}");
        assert_eq!(
            body_json(response).await,
            json!({"code": "BAD_REQUEST", "message": "invalid title"})
        );
    }
}

#[tokio::test]
async fn test_malformed_bodies_are_invalid_request() {
    let app = app();
    let cases = [
        (Method::POST, "/todos", json!({})),
        (Method::POST, "/todos", json!({"title": 7})),
        (Method::PUT, "/todos/x", json!({"title": "no flag"})),
        (Method::PUT, "/todos/x", json!({"completed": true})),
    ];
    for (method, uri, body) in cases {
        let response = send(&app, method, uri, Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(
            body_json(response).await,
            json!({"code": "BAD_REQUEST", "message": "invalid request"})
        );
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/todos")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_ids_are_not_found() {
    let app = app();
    let response = send(
        &app,
        Method::PUT,
        "/todos/ghost",
        Some(json!({"title": "x", "completed": false})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, Method::DELETE, "/todos/ghost", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_id_is_conflict() {
    let app = router(AppState::new(
        InMemoryTodoRepository::with_todos([todo("dup", "existing", false)]),
        FixedIdGenerator::new("dup"),
    ));
    let response = send(&app, Method::POST, "/todos", Some(json!({"title": "new"}))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app();
    let response = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));

    let response = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ready"}));
}

/// A repository that reports a locked store, except `delete`, which fails internally.
struct LockedRepository;

impl TodoRepository for LockedRepository {
    fn list(&self, _ctx: &Context) -> todokv_core::TodoResult<Vec<todokv_core::Todo>> {
        Err(todokv_core::TodoError::busy("locked"))
    }

    fn get(&self, _ctx: &Context, _id: &str) -> todokv_core::TodoResult<todokv_core::Todo> {
        Err(todokv_core::TodoError::busy("locked"))
    }

    fn create(&self, _ctx: &Context, _todo: &todokv_core::Todo) -> todokv_core::TodoResult<()> {
        Err(todokv_core::TodoError::busy("locked"))
    }

    fn update(&self, _ctx: &Context, _todo: &todokv_core::Todo) -> todokv_core::TodoResult<()> {
        Err(todokv_core::TodoError::busy("locked"))
    }

    fn delete(&self, _ctx: &Context, _id: &str) -> todokv_core::TodoResult<()> {
        Err(todokv_core::TodoError::internal("corrupt"))
    }
}

#[tokio::test]
async fn test_store_failures_map_to_5xx() {
    let app = router(AppState::new(LockedRepository, SequentialIdGenerator::default()));

    let response = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await, json!({"status": "not_ready"}));

    let response = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = send(&app, Method::DELETE, "/todos/a", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"code": "INTERNAL_SERVER_ERROR", "message": "internal error"})
    );
}

#[tokio::test]
async fn test_failed_readiness_keeps_request_id() {
    let app = router(AppState::new(LockedRepository, SequentialIdGenerator::default()));
    let request = Request::builder()
        .uri("/readyz")
        .header(REQUEST_ID_HEADER, "ready-7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "ready-7");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = app();
    let request = Request::builder()
        .uri("/healthz")
        .header(REQUEST_ID_HEADER, "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");

    let response = send(&app, Method::GET, "/todos/missing", None).await;
    let generated = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let response = send(&app(), Method::GET, "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
