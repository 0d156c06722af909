//! # todokv runtime
//!
//! The application layer of todokv.
//!
//! ## Core Components
//!
//! - **`TodoService`**: use cases over any [`TodoRepository`](todokv_core::TodoRepository)
//! - **`UuidGenerator`**: production identifier source
//! - **Metrics**: Prometheus recorder installation and metric descriptions
//!
//! ## Example
//!
//! ```
//! use todokv_core::Context;
//! use todokv_runtime::TodoService;
//! use todokv_testing::{FixedIdGenerator, InMemoryTodoRepository};
//!
//! let service = TodoService::new(InMemoryTodoRepository::new(), FixedIdGenerator::new("id-1"));
//! let ctx = Context::background();
//!
//! let todo = service.create(&ctx, "buy milk").unwrap();
//! assert_eq!(todo.id, "id-1");
//! assert!(!todo.completed);
//! ```

pub mod id;
pub mod metrics;
pub mod service;

pub use id::UuidGenerator;
pub use service::TodoService;
