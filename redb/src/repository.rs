//! Durable [`TodoRepository`] over the `todos` bucket.
//!
//! Each todo is stored as one JSON record under its identifier. The record
//! holds exactly three fields: `id`, `title`, `completed`.

use crate::database::{Bucket, Database};
use crate::error::storage;
use metrics::{counter, histogram};
use redb::{ReadableTable, TableDefinition};
use std::sync::Arc;
use std::time::Instant;
use todokv_core::telemetry::{REPOSITORY_OPERATIONS_TOTAL, REPOSITORY_OPERATION_DURATION_SECONDS};
use todokv_core::{Context, Todo, TodoError, TodoRepository, TodoResult, require_id};

/// The bucket holding every todo record.
pub const TODOS: Bucket = TableDefinition::new("todos");

/// Todo repository backed by a shared [`Database`].
///
/// Existence checks run in the same write transaction as the mutation they
/// guard. Of two racing `create` calls for one identifier, exactly one
/// commits and the other sees `Conflict`.
#[derive(Clone, Debug)]
pub struct RedbTodoRepository {
    db: Arc<Database>,
}

impl RedbTodoRepository {
    /// Creates a repository over `db`, creating the `todos` bucket if absent.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the bucket cannot be created.
    pub fn new(db: Arc<Database>) -> TodoResult<Self> {
        db.ensure_bucket(TODOS)?;
        Ok(Self { db })
    }

    /// The underlying database handle.
    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

fn encode(todo: &Todo) -> TodoResult<Vec<u8>> {
    serde_json::to_vec(todo)
        .map_err(|e| TodoError::internal_with_source(format!("cannot encode todo {}", todo.id), e))
}

fn decode(key: &str, bytes: &[u8]) -> TodoResult<Todo> {
    serde_json::from_slice(bytes).map_err(|e| TodoError::decode(key, e))
}

/// Drains `records`, checking `ctx` before pulling each one.
fn collect_checked(
    ctx: &Context,
    mut records: impl Iterator<Item = TodoResult<Todo>>,
) -> TodoResult<Vec<Todo>> {
    let mut todos = Vec::new();
    loop {
        ctx.check()?;
        match records.next() {
            Some(record) => todos.push(record?),
            None => return Ok(todos),
        }
    }
}

/// Records latency and outcome of one repository call.
fn observe<T>(op: &'static str, f: impl FnOnce() -> TodoResult<T>) -> TodoResult<T> {
    let started = Instant::now();
    let result = f();
    histogram!(REPOSITORY_OPERATION_DURATION_SECONDS, "op" => op)
        .record(started.elapsed().as_secs_f64());
    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.kind().as_str(),
    };
    counter!(REPOSITORY_OPERATIONS_TOTAL, "op" => op, "outcome" => outcome).increment(1);
    result
}

impl TodoRepository for RedbTodoRepository {
    fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>> {
        observe("list", || {
            ctx.check()?;
            let todos = self.db.read(|tx| {
                let table = tx.open_table(TODOS).map_err(storage)?;
                let records = table.iter().map_err(storage)?.map(|entry| {
                    let (key, value) = entry.map_err(storage)?;
                    decode(key.value(), value.value())
                });
                collect_checked(ctx, records)
            })?;
            tracing::debug!(count = todos.len(), "Listed todos");
            Ok(todos)
        })
    }

    fn get(&self, ctx: &Context, id: &str) -> TodoResult<Todo> {
        observe("get", || {
            ctx.check()?;
            self.db.read(|tx| {
                let table = tx.open_table(TODOS).map_err(storage)?;
                let record = table.get(id).map_err(storage)?;
                match record {
                    Some(bytes) => decode(id, bytes.value()),
                    None => Err(TodoError::not_found(id)),
                }
            })
        })
    }

    fn create(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        observe("create", || {
            ctx.check()?;
            require_id(&todo.id)?;
            todo.validate()?;
            let payload = encode(todo)?;
            self.db.write(|tx| {
                ctx.check()?;
                let mut table = tx.open_table(TODOS).map_err(storage)?;
                if table.get(todo.id.as_str()).map_err(storage)?.is_some() {
                    return Err(TodoError::conflict(&todo.id));
                }
                table
                    .insert(todo.id.as_str(), payload.as_slice())
                    .map_err(storage)?;
                Ok(())
            })?;
            tracing::debug!(id = %todo.id, "Created todo");
            Ok(())
        })
    }

    fn update(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        observe("update", || {
            ctx.check()?;
            require_id(&todo.id)?;
            todo.validate()?;
            let payload = encode(todo)?;
            self.db.write(|tx| {
                ctx.check()?;
                let mut table = tx.open_table(TODOS).map_err(storage)?;
                if table.get(todo.id.as_str()).map_err(storage)?.is_none() {
                    return Err(TodoError::not_found(&todo.id));
                }
                table
                    .insert(todo.id.as_str(), payload.as_slice())
                    .map_err(storage)?;
                Ok(())
            })?;
            tracing::debug!(id = %todo.id, completed = todo.completed, "Updated todo");
            Ok(())
        })
    }

    fn delete(&self, ctx: &Context, id: &str) -> TodoResult<()> {
        observe("delete", || {
            ctx.check()?;
            require_id(id)?;
            self.db.write(|tx| {
                ctx.check()?;
                let mut table = tx.open_table(TODOS).map_err(storage)?;
                let removed = table.remove(id).map_err(storage)?.is_some();
                if removed {
                    Ok(())
                } else {
                    Err(TodoError::not_found(id))
                }
            })?;
            tracing::debug!(id, "Deleted todo");
            Ok(())
        })
    }
}
