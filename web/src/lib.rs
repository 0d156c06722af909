//! Axum HTTP transport for todokv.
//!
//! # Request Flow
//!
//! 1. **Request id** middleware tags the request and opens its span
//! 2. **Extract** path and JSON body (bad bodies become `400 invalid request`)
//! 3. **Run** the service call on the blocking pool under a request deadline
//! 4. **Map** the result, or the `TodoError`, to an HTTP response
//! 5. **Log** one line per request and record HTTP metrics
//!
//! # Example
//!
//! ```no_run
//! use todokv_runtime::UuidGenerator;
//! use todokv_testing::InMemoryTodoRepository;
//! use todokv_web::{AppState, router};
//!
//! # async fn example() -> std::io::Result<()> {
//! let state = AppState::new(InMemoryTodoRepository::new(), UuidGenerator);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, router(state)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{Router, routing::get};
use tower_http::catch_panic::CatchPanicLayer;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::JsonBody;
pub use middleware::{REQUEST_ID_HEADER, RequestId, request_id_layer};
pub use state::{AppState, SharedService};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// Build the complete HTTP router over `state`.
///
/// Panics inside handlers become 500 responses; every response, panics
/// included, carries the request id and is logged.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .layer(CatchPanicLayer::new())
        .layer(request_id_layer())
        .with_state(state)
}
