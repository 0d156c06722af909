//! HTTP request handlers.
//!
//! Service calls are synchronous, so every handler runs its call on the
//! blocking pool through [`run_service`].

pub mod health;
pub mod todos;

use crate::error::AppError;
use crate::state::{AppState, SharedService};
use std::sync::Arc;
use std::time::Duration;
use todokv_core::{Context, TodoResult};

pub use health::{healthz, metrics, readyz};
pub use todos::{create_todo, delete_todo, get_todo, list_todos, update_todo};

/// Runs `f` against the service on the blocking pool under a fresh context
/// with the given deadline.
///
/// If the handler future is dropped (the client went away, or shutdown
/// aborted the request), the context is cancelled and the call stops at its
/// next check. The call is tracked by [`AppState::tasks`] until it returns.
pub(crate) async fn run_service<T, F>(
    state: &AppState,
    timeout: Duration,
    f: F,
) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&SharedService, &Context) -> TodoResult<T> + Send + 'static,
{
    let ctx = Context::with_timeout(timeout);
    let _cancel_on_drop = ctx.token().clone().drop_guard();
    let service = Arc::clone(state.service());

    state
        .tasks()
        .spawn_blocking(move || f(&service, &ctx))
        .await
        .map_err(|e| AppError::from(anyhow::Error::new(e)))?
        .map_err(AppError::from)
}
