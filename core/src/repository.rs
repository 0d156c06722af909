//! The persistence capability for todos.
//!
//! # Implementations
//!
//! - `RedbTodoRepository` (in `todokv-redb`): durable, single-file embedded store
//! - `InMemoryTodoRepository` (in `todokv-testing`): fast, deterministic tests
//!
//! Both enforce the same rules, and the shared conformance suite in
//! `todokv-testing` runs against each of them.
//!
//! # Synchronous by design
//!
//! Every call completes before returning and spawns nothing. Async callers
//! run repository calls on a blocking pool.

use crate::context::Context;
use crate::domain::Todo;
use crate::error::TodoResult;
use std::sync::Arc;

/// Persistence operations for [`Todo`] entities.
///
/// Every operation checks `ctx` before starting work. Implementations must
/// perform existence checks and the mutation they guard inside one atomic
/// transaction, so that of two concurrent `create` calls for the same
/// identifier exactly one succeeds.
///
/// # Thread Safety
///
/// Implementations are `Send + Sync` and shared across request tasks.
pub trait TodoRepository: Send + Sync {
    /// Returns every todo in ascending identifier order.
    ///
    /// An empty store yields an empty vector. The context is checked again
    /// between records so a long listing can be aborted.
    ///
    /// # Errors
    ///
    /// - `Cancelled` / `Timeout`: the context fired
    /// - `Decode`: any stored record is malformed (the whole call fails)
    /// - `Internal`: storage failure
    fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>>;

    /// Returns the todo stored under `id`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no record under `id`
    /// - `Decode`: the stored record is malformed
    /// - `Cancelled` / `Timeout` / `Internal`
    fn get(&self, ctx: &Context, id: &str) -> TodoResult<Todo>;

    /// Stores a new todo.
    ///
    /// # Errors
    ///
    /// - `MissingId` / `InvalidTitle`: rejected before any transaction
    /// - `Conflict`: a record already uses `todo.id`; nothing is written
    /// - `Cancelled` / `Timeout` / `Internal`
    fn create(&self, ctx: &Context, todo: &Todo) -> TodoResult<()>;

    /// Replaces an existing todo wholesale.
    ///
    /// # Errors
    ///
    /// - `MissingId` / `InvalidTitle`: rejected before any transaction
    /// - `NotFound`: no record under `todo.id`
    /// - `Cancelled` / `Timeout` / `Internal`
    fn update(&self, ctx: &Context, todo: &Todo) -> TodoResult<()>;

    /// Removes the todo stored under `id`.
    ///
    /// # Errors
    ///
    /// - `MissingId`: `id` is empty
    /// - `NotFound`: no record under `id`
    /// - `Cancelled` / `Timeout` / `Internal`
    fn delete(&self, ctx: &Context, id: &str) -> TodoResult<()>;
}

impl<R: TodoRepository + ?Sized> TodoRepository for Arc<R> {
    fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>> {
        (**self).list(ctx)
    }

    fn get(&self, ctx: &Context, id: &str) -> TodoResult<Todo> {
        (**self).get(ctx, id)
    }

    fn create(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        (**self).create(ctx, todo)
    }

    fn update(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        (**self).update(ctx, todo)
    }

    fn delete(&self, ctx: &Context, id: &str) -> TodoResult<()> {
        (**self).delete(ctx, id)
    }
}

impl<R: TodoRepository + ?Sized> TodoRepository for &R {
    fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>> {
        (**self).list(ctx)
    }

    fn get(&self, ctx: &Context, id: &str) -> TodoResult<Todo> {
        (**self).get(ctx, id)
    }

    fn create(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        (**self).create(ctx, todo)
    }

    fn update(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        (**self).update(ctx, todo)
    }

    fn delete(&self, ctx: &Context, id: &str) -> TodoResult<()> {
        (**self).delete(ctx, id)
    }
}
