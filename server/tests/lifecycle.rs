//! Process lifecycle tests over a real socket and a real store file.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Notify, oneshot};
use tokio_util::task::TaskTracker;
use todokv_core::{Context, ErrorKind, Todo, TodoError, TodoRepository, TodoResult};
use todokv_redb::{Database, RedbTodoRepository, StorageConfig};
use todokv_runtime::UuidGenerator;
use todokv_server::config::ServerConfig;
use todokv_server::lifecycle::DRAIN_TIMEOUT;
use todokv_server::{Application, Config, ServerError, serve_until};
use todokv_web::{AppState, router};

fn local(shutdown_timeout: Duration) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_timeout,
    }
}

async fn http(addr: SocketAddr, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_then_releases_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("todo.db");
    let db = Arc::new(Database::open(&path, Duration::from_secs(1)).unwrap());
    let repository = RedbTodoRepository::new(Arc::clone(&db)).unwrap();

    let app = Application::bind(
        &local(Duration::from_secs(5)),
        router(AppState::new(repository, UuidGenerator)),
    )
    .await
    .unwrap();
    let addr = app.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(app.run_until(async move {
        let _ = stopped.await;
    }));

    let health = http(addr, "GET", "/healthz", "").await;
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.to_ascii_lowercase().contains("x-request-id:"));

    let created = http(addr, "POST", "/todos", r#"{"title":"persisted"}"#).await;
    assert!(created.starts_with("HTTP/1.1 201"), "{created}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    Database::close_shared(db).unwrap();

    let reopened = Arc::new(Database::open(&path, Duration::from_secs(1)).unwrap());
    let repository = RedbTodoRepository::new(reopened).unwrap();
    let todos = repository.list(&Context::background()).unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "persisted");
}

/// Sends a request without `Connection: close` and returns the whole response.
async fn open_request(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_shutdown_aborts_requests_past_timeout() {
    let entered = Arc::new(Notify::new());
    let finished = Arc::new(AtomicBool::new(false));
    let (handler_entered, handler_finished) = (Arc::clone(&entered), Arc::clone(&finished));
    let slow = Router::new().route(
        "/slow",
        get(move || {
            let entered = Arc::clone(&handler_entered);
            let finished = Arc::clone(&handler_finished);
            async move {
                entered.notify_one();
                tokio::time::sleep(Duration::from_millis(600)).await;
                finished.store(true, Ordering::SeqCst);
                "done"
            }
        }),
    );

    let app = Application::bind(&local(Duration::from_millis(100)), slow)
        .await
        .unwrap();
    let addr = app.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(app.run_until(async move {
        let _ = stopped.await;
    }));
    let client = tokio::spawn(open_request(addr, "/slow"));

    entered.notified().await;
    let started = Instant::now();
    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_millis(600));

    let response = client.await.unwrap();
    assert!(response.starts_with("HTTP/1.1 503"), "{response}");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!finished.load(Ordering::SeqCst), "aborted handler kept running");
}

/// Lists forever, until its context fires.
#[derive(Default)]
struct StuckRepository {
    entered: AtomicBool,
    saw_cancel: AtomicBool,
}

impl TodoRepository for StuckRepository {
    fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>> {
        self.entered.store(true, Ordering::SeqCst);
        loop {
            if let Err(e) = ctx.check() {
                self.saw_cancel.store(true, Ordering::SeqCst);
                return Err(e);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn get(&self, _ctx: &Context, id: &str) -> TodoResult<Todo> {
        Err(TodoError::not_found(id))
    }

    fn create(&self, _ctx: &Context, _todo: &Todo) -> TodoResult<()> {
        Ok(())
    }

    fn update(&self, _ctx: &Context, todo: &Todo) -> TodoResult<()> {
        Err(TodoError::not_found(&todo.id))
    }

    fn delete(&self, _ctx: &Context, id: &str) -> TodoResult<()> {
        Err(TodoError::not_found(id))
    }
}

#[tokio::test]
async fn test_aborted_request_cancels_its_blocking_call() {
    let repository = Arc::new(StuckRepository::default());
    let tasks = TaskTracker::new();
    let state = AppState::new(Arc::clone(&repository), UuidGenerator)
        .with_request_timeout(Duration::from_secs(60))
        .with_task_tracker(tasks.clone());

    let app = Application::bind(&local(Duration::from_millis(100)), router(state))
        .await
        .unwrap();
    let addr = app.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(app.run_until(async move {
        let _ = stopped.await;
    }));
    let client = tokio::spawn(open_request(addr, "/todos"));

    while !repository.entered.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    let response = client.await.unwrap();
    assert!(response.starts_with("HTTP/1.1 503"), "{response}");

    tasks.close();
    tokio::time::timeout(DRAIN_TIMEOUT, tasks.wait())
        .await
        .expect("blocking call should stop once its request is dropped");
    assert!(repository.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_serve_until_closes_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("todo.db");
    let config = Config {
        server: local(Duration::from_secs(1)),
        storage: StorageConfig::new(&path),
        ..Config::default()
    };

    serve_until(config, None, async {}).await.unwrap();

    let reopened = Database::open(&path, Duration::ZERO).unwrap();
    reopened.close().unwrap();
}

#[tokio::test]
async fn test_startup_fails_fast_on_locked_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("todo.db");
    let _holder = Database::open(&path, Duration::from_secs(1)).unwrap();

    let config = Config {
        server: local(Duration::from_secs(1)),
        storage: StorageConfig::new(&path).with_lock_timeout(Duration::from_millis(50)),
        ..Config::default()
    };

    let err = serve_until(config, None, std::future::pending())
        .await
        .expect_err("a locked store must stop startup");
    match err {
        ServerError::Storage(e) => assert_eq!(e.kind(), ErrorKind::Unavailable),
        other => panic!("expected a storage error, got {other:?}"),
    }
}
