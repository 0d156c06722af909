//! Todo use cases.
//!
//! [`TodoService`] is the only entry point the transport uses. It owns no
//! storage of its own: identifiers come from an [`IdGenerator`] and every
//! read or write goes through a [`TodoRepository`]. Errors pass through
//! unchanged and nothing is retried.

use todokv_core::{Context, IdGenerator, Todo, TodoError, TodoRepository, TodoResult, require_id};

/// Application service over a repository and an identifier source.
#[derive(Debug)]
pub struct TodoService<R, G> {
    repository: R,
    ids: G,
}

impl<R, G> TodoService<R, G>
where
    R: TodoRepository,
    G: IdGenerator,
{
    /// Creates a service over `repository`, drawing identifiers from `ids`.
    #[must_use]
    pub const fn new(repository: R, ids: G) -> Self {
        Self { repository, ids }
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Every todo, in identifier order.
    ///
    /// # Errors
    ///
    /// Propagates repository errors unchanged.
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    pub fn list(&self, ctx: &Context) -> TodoResult<Vec<Todo>> {
        self.repository.list(ctx)
    }

    /// The todo stored under `id`.
    ///
    /// # Errors
    ///
    /// `MissingId` for an empty `id`; otherwise repository errors unchanged.
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    pub fn get(&self, ctx: &Context, id: &str) -> TodoResult<Todo> {
        require_id(id)?;
        self.repository.get(ctx, id)
    }

    /// Creates an open todo with a fresh identifier and returns it.
    ///
    /// The returned value is the one handed to the repository; it is not
    /// read back.
    ///
    /// # Errors
    ///
    /// - `InvalidTitle`: rejected before the repository is called
    /// - `Internal`: the generator produced an empty identifier
    /// - repository errors unchanged
    #[tracing::instrument(level = "debug", skip(self, ctx, title))]
    pub fn create(&self, ctx: &Context, title: &str) -> TodoResult<Todo> {
        let todo = Todo::new(self.ids.new_id(), title);
        todo.validate()?;
        if todo.id.is_empty() {
            return Err(TodoError::internal("identifier generator returned an empty id"));
        }
        self.repository.create(ctx, &todo)?;
        tracing::debug!(id = %todo.id, "Todo created");
        Ok(todo)
    }

    /// Replaces the title and completion flag of an existing todo.
    ///
    /// # Errors
    ///
    /// - `MissingId` / `InvalidTitle`: rejected before the repository is called
    /// - `NotFound` and other repository errors unchanged
    #[tracing::instrument(level = "debug", skip(self, ctx, title))]
    pub fn update(&self, ctx: &Context, id: &str, title: &str, completed: bool) -> TodoResult<Todo> {
        require_id(id)?;
        let todo = Todo::new(id, title).with_completed(completed);
        todo.validate()?;
        self.repository.update(ctx, &todo)?;
        Ok(todo)
    }

    /// Removes the todo stored under `id`.
    ///
    /// # Errors
    ///
    /// `MissingId` for an empty `id`; otherwise repository errors unchanged.
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    pub fn delete(&self, ctx: &Context, id: &str) -> TodoResult<()> {
        require_id(id)?;
        self.repository.delete(ctx, id)
    }

    /// Readiness probe: the store can serve a full listing.
    ///
    /// # Errors
    ///
    /// Whatever the listing fails with.
    pub fn ready(&self, ctx: &Context) -> TodoResult<()> {
        self.repository.list(ctx).map(drop)
    }
}
