//! # todokv testing
//!
//! Testing utilities for todokv.
//!
//! This crate provides:
//! - [`InMemoryTodoRepository`]: a `BTreeMap`-backed `TodoRepository`
//! - Deterministic identifier generators
//! - [`conformance`]: checks every `TodoRepository` implementation must pass
//!
//! ## Example
//!
//! ```
//! use todokv_core::{Context, TodoRepository};
//! use todokv_testing::{InMemoryTodoRepository, todo};
//!
//! let repo = InMemoryTodoRepository::new();
//! let ctx = Context::background();
//!
//! repo.create(&ctx, &todo("id-1", "buy milk", false)).unwrap();
//! assert_eq!(repo.len(), 1);
//! ```

pub mod conformance;
pub mod memory;

/// Mock implementations of the identifier generator.
pub mod mocks {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use todokv_core::IdGenerator;

    /// Always returns the same identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use todokv_testing::mocks::FixedIdGenerator;
    /// use todokv_core::IdGenerator;
    ///
    /// let ids = FixedIdGenerator::new("id-1");
    /// assert_eq!(ids.new_id(), ids.new_id());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedIdGenerator {
        id: String,
    }

    impl FixedIdGenerator {
        /// Create a generator that always yields `id`
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self { id: id.into() }
        }
    }

    impl IdGenerator for FixedIdGenerator {
        fn new_id(&self) -> String {
            self.id.clone()
        }
    }

    /// Yields `{prefix}-1`, `{prefix}-2`, ...
    #[derive(Debug)]
    pub struct SequentialIdGenerator {
        prefix: String,
        next: AtomicUsize,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose identifiers start with `prefix`
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicUsize::new(1),
            }
        }
    }

    impl Default for SequentialIdGenerator {
        fn default() -> Self {
            Self::new("id")
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn new_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            format!("{}-{n}", self.prefix)
        }
    }

    /// Yields the scripted identifiers in order, then empty strings.
    ///
    /// Useful to exercise the empty-identifier failure path.
    #[derive(Debug, Default)]
    pub struct ScriptedIdGenerator {
        ids: Mutex<Vec<String>>,
    }

    impl ScriptedIdGenerator {
        /// Create a generator that replays `ids`
        #[must_use]
        pub fn new<I, S>(ids: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
            ids.reverse();
            Self {
                ids: Mutex::new(ids),
            }
        }
    }

    impl IdGenerator for ScriptedIdGenerator {
        fn new_id(&self) -> String {
            self.ids
                .lock()
                .map(|mut ids| ids.pop().unwrap_or_default())
                .unwrap_or_default()
        }
    }
}

/// Builds a todo from its three fields.
#[must_use]
pub fn todo(id: &str, title: &str, completed: bool) -> todokv_core::Todo {
    todokv_core::Todo::new(id, title).with_completed(completed)
}

// Re-export commonly used items
pub use memory::InMemoryTodoRepository;
pub use mocks::{FixedIdGenerator, ScriptedIdGenerator, SequentialIdGenerator};
