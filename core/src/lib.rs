//! # todokv core
//!
//! Domain types and the storage-facing traits for the todokv service.
//!
//! This crate has no I/O of its own. It defines:
//!
//! - [`Todo`]: the sole entity, with its title validation rule
//! - [`TodoRepository`]: the persistence capability (embedded-store backed in
//!   `todokv-redb`, in-memory in `todokv-testing`)
//! - [`IdGenerator`]: the source of fresh todo identifiers
//! - [`Context`]: cooperative cancellation and deadlines for every operation
//! - [`TodoError`]: the error taxonomy shared by every layer
//!
//! ## Example
//!
//! ```
//! use todokv_core::{Todo, TodoError};
//!
//! let todo = Todo::new("id-1", "buy milk");
//! assert!(todo.validate().is_ok());
//!
//! let blank = Todo::new("id-2", "   ");
//! assert!(matches!(blank.validate(), Err(TodoError::InvalidTitle)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod domain;
pub mod error;
pub mod id;
pub mod repository;
pub mod telemetry;

pub use context::Context;
pub use domain::{MAX_TITLE_LEN, Todo, require_id, validate_title};
pub use error::{BoxError, ErrorKind, TodoError, TodoResult};
pub use id::IdGenerator;
pub use repository::TodoRepository;
