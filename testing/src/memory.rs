//! In-memory repository for fast, deterministic tests.
//!
//! [`InMemoryTodoRepository`] follows the same rules as the embedded store:
//! key-ordered listing, existence-checked mutations under one lock, and the
//! same pre-checks before any mutation. It also counts mutation calls so tests
//! can assert that invalid input never reaches storage.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use todokv_core::{Context, Todo, TodoError, TodoRepository, TodoResult, require_id};

#[derive(Debug, Default)]
struct Counters {
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

/// `BTreeMap`-backed todo repository.
///
/// Clones share the same underlying map and counters.
///
/// # Example
///
/// ```
/// use todokv_core::{Context, TodoRepository, TodoError};
/// use todokv_testing::{InMemoryTodoRepository, todo};
///
/// let repo = InMemoryTodoRepository::new();
/// let ctx = Context::background();
///
/// repo.create(&ctx, &todo("a", "first", false)).unwrap();
/// let err = repo.create(&ctx, &todo("a", "second", false)).unwrap_err();
/// assert!(matches!(err, TodoError::Conflict { .. }));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<RwLock<BTreeMap<String, Todo>>>,
    counters: Arc<Counters>,
}

impl InMemoryTodoRepository {
    /// Create a new empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `todos`, bypassing validation
    #[must_use]
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.todos.write().unwrap();
            for todo in todos {
                map.insert(todo.id.clone(), todo);
            }
        }
        repo
    }

    /// Number of stored todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.read().unwrap().len()
    }

    /// Whether the repository is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.read().unwrap().is_empty()
    }

    /// Stored todo under `id`, without context checks
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<Todo> {
        self.todos.read().unwrap().get(id).cloned()
    }

    /// Number of `create` calls that reached the repository
    #[must_use]
    pub fn creates(&self) -> usize {
        self.counters.creates.load(Ordering::SeqCst)
    }

    /// Number of `update` calls that reached the repository
    #[must_use]
    pub fn updates(&self) -> usize {
        self.counters.updates.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls that reached the repository
    #[must_use]
    pub fn deletes(&self) -> usize {
        self.counters.deletes.load(Ordering::SeqCst)
    }

    fn precheck(ctx: &Context, todo: &Todo) -> TodoResult<()> {
        ctx.check()?;
        require_id(&todo.id)?;
        todo.validate()
    }
}

impl TodoRepository for InMemoryTodoRepository {
    fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>> {
        ctx.check()?;
        let todos = self.todos.read().unwrap();
        let mut out = Vec::with_capacity(todos.len());
        for todo in todos.values() {
            ctx.check()?;
            out.push(todo.clone());
        }
        Ok(out)
    }

    fn get(&self, ctx: &Context, id: &str) -> TodoResult<Todo> {
        ctx.check()?;
        self.todos
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| TodoError::not_found(id))
    }

    fn create(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        Self::precheck(ctx, todo)?;
        let mut todos = self.todos.write().unwrap();
        if todos.contains_key(&todo.id) {
            return Err(TodoError::conflict(&todo.id));
        }
        todos.insert(todo.id.clone(), todo.clone());
        Ok(())
    }

    fn update(&self, ctx: &Context, todo: &Todo) -> TodoResult<()> {
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        Self::precheck(ctx, todo)?;
        let mut todos = self.todos.write().unwrap();
        let Some(existing) = todos.get_mut(&todo.id) else {
            return Err(TodoError::not_found(&todo.id));
        };
        *existing = todo.clone();
        Ok(())
    }

    fn delete(&self, ctx: &Context, id: &str) -> TodoResult<()> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        require_id(id)?;
        self.todos
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TodoError::not_found(id))
    }
}
