//! Embedded todo storage for todokv.
//!
//! This crate provides the durable [`TodoRepository`](todokv_core::TodoRepository)
//! implementation. It keeps every todo in a single [redb] file:
//!
//! - [`Database`] owns the file, its exclusive lock, and the scoped read and
//!   write transactions
//! - [`RedbTodoRepository`] maps todos to JSON records in the `todos` bucket
//!   and enforces the conflict and not-found rules inside those transactions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use todokv_core::{Context, Todo, TodoRepository};
//! use todokv_redb::{Database, RedbTodoRepository};
//!
//! # fn example() -> Result<(), todokv_core::TodoError> {
//! let db = Arc::new(Database::open("todo.db", Duration::from_secs(1))?);
//! let repo = RedbTodoRepository::new(Arc::clone(&db))?;
//!
//! repo.create(&Context::background(), &Todo::new("id-1", "buy milk"))?;
//!
//! drop(repo);
//! Database::close_shared(db)?;
//! # Ok(())
//! # }
//! ```
//!
//! [redb]: https://docs.rs/redb

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod database;
mod error;
pub mod repository;

pub use database::{Bucket, Database, DEFAULT_LOCK_TIMEOUT, StorageConfig};
pub use repository::{RedbTodoRepository, TODOS};
