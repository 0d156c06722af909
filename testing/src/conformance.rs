//! Conformance test suite for [`TodoRepository`] implementations.
//!
//! Every implementation, embedded or in-memory, runs the same checks so the
//! service can rely on identical conflict and not-found semantics whichever
//! store sits underneath.
//!
//! Each function expects a fresh, empty repository.
//!
//! ```no_run
//! use todokv_testing::{InMemoryTodoRepository, conformance};
//!
//! #[test]
//! fn create_twice_conflicts() {
//!     conformance::create_twice_conflicts(&InMemoryTodoRepository::new());
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | CRUD | round-trip, wholesale update, hard delete |
//! | Existence | conflict on create, not-found on get/update/delete |
//! | Listing | key order, empty store |
//! | Pre-checks | invalid input rejected before storage |
//! | Cancellation | fired context fails fast |
//! | Concurrent | exactly one of racing creates wins |

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(clippy::missing_panics_doc)] // Conformance checks panic on violation

use crate::todo;
use std::time::Duration;
use todokv_core::{Context, MAX_TITLE_LEN, TodoError, TodoRepository};

// ============================================================================
// CRUD
// ============================================================================

/// `create` then `get` returns a value equal in all three fields.
pub fn create_then_get_round_trips<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    let original = todo("1", "buy milk", false);
    repo.create(&ctx, &original).expect("create");
    assert_eq!(repo.get(&ctx, "1").expect("get"), original);

    let done = todo("2", "  padded title  ", true);
    repo.create(&ctx, &done).expect("create completed");
    assert_eq!(repo.get(&ctx, "2").expect("get"), done, "title stored as given");
}

/// `update` replaces title and flag wholesale.
pub fn update_replaces_wholesale<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    repo.create(&ctx, &todo("1", "buy milk", false)).expect("create");
    let updated = todo("1", "buy milk and eggs", true);
    repo.update(&ctx, &updated).expect("update");
    assert_eq!(repo.get(&ctx, "1").expect("get"), updated);
}

/// `delete` removes the record.
pub fn delete_removes_record<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    repo.create(&ctx, &todo("1", "buy milk", false)).expect("create");
    repo.delete(&ctx, "1").expect("delete");
    let err = repo.get(&ctx, "1").unwrap_err();
    assert!(matches!(err, TodoError::NotFound { .. }), "got {err:?}");
}

// ============================================================================
// Existence
// ============================================================================

/// A second `create` with the same id conflicts and keeps the first value.
pub fn create_twice_conflicts<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    let first = todo("x", "first", false);
    repo.create(&ctx, &first).expect("first create");

    let err = repo.create(&ctx, &todo("x", "second", true)).unwrap_err();
    assert!(matches!(err, TodoError::Conflict { ref id } if id == "x"), "got {err:?}");
    assert_eq!(repo.get(&ctx, "x").expect("get"), first);
}

/// `get` of an unknown id is `NotFound`.
pub fn get_missing_is_not_found<R: TodoRepository>(repo: &R) {
    let err = repo.get(&Context::background(), "nope").unwrap_err();
    assert!(matches!(err, TodoError::NotFound { ref id } if id == "nope"), "got {err:?}");
}

/// `update` of an unknown id is `NotFound` and writes nothing.
pub fn update_missing_is_not_found<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    let keep = todo("keep", "untouched", false);
    repo.create(&ctx, &keep).expect("create");

    let err = repo.update(&ctx, &todo("missing", "x", true)).unwrap_err();
    assert!(matches!(err, TodoError::NotFound { .. }), "got {err:?}");
    assert_eq!(repo.list(&ctx).expect("list"), vec![keep]);
}

/// `delete` of an unknown id is `NotFound` and removes nothing.
pub fn delete_missing_is_not_found<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    let keep = todo("keep", "untouched", false);
    repo.create(&ctx, &keep).expect("create");

    let err = repo.delete(&ctx, "missing").unwrap_err();
    assert!(matches!(err, TodoError::NotFound { .. }), "got {err:?}");
    assert_eq!(repo.list(&ctx).expect("list"), vec![keep]);
}

/// Deleting twice: first succeeds, second is `NotFound`.
pub fn delete_twice_is_not_found<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    repo.create(&ctx, &todo("1", "buy milk", false)).expect("create");
    repo.delete(&ctx, "1").expect("first delete");
    let err = repo.delete(&ctx, "1").unwrap_err();
    assert!(matches!(err, TodoError::NotFound { .. }), "got {err:?}");
}

// ============================================================================
// Listing
// ============================================================================

/// An empty store lists as an empty vector.
pub fn list_empty_is_empty<R: TodoRepository>(repo: &R) {
    let todos = repo.list(&Context::background()).expect("list on empty store");
    assert!(todos.is_empty());
}

/// Listing returns every record exactly once, in ascending id order.
pub fn list_is_key_ordered<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    for (id, title) in [("c", "third"), ("a", "first"), ("b", "second")] {
        repo.create(&ctx, &todo(id, title, false)).expect("create");
    }
    let todos = repo.list(&ctx).expect("list");
    assert_eq!(
        todos,
        vec![
            todo("a", "first", false),
            todo("b", "second", false),
            todo("c", "third", false),
        ]
    );
}

// ============================================================================
// Pre-checks
// ============================================================================

/// Empty ids are rejected by every id-taking operation.
pub fn empty_id_is_rejected<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    let err = repo.create(&ctx, &todo("", "title", false)).unwrap_err();
    assert!(matches!(err, TodoError::MissingId), "create: {err:?}");
    let err = repo.update(&ctx, &todo("", "title", false)).unwrap_err();
    assert!(matches!(err, TodoError::MissingId), "update: {err:?}");
    let err = repo.delete(&ctx, "").unwrap_err();
    assert!(matches!(err, TodoError::MissingId), "delete: {err:?}");
    assert!(repo.list(&ctx).expect("list").is_empty());
}

/// Invalid titles are rejected before anything is written.
pub fn invalid_title_is_rejected<R: TodoRepository>(repo: &R) {
    let ctx = Context::background();
    let err = repo.create(&ctx, &todo("1", "   ", false)).unwrap_err();
    assert!(matches!(err, TodoError::InvalidTitle), "blank: {err:?}");

    let long = "a".repeat(MAX_TITLE_LEN + 1);
    let err = repo.create(&ctx, &todo("1", &long, false)).unwrap_err();
    assert!(matches!(err, TodoError::InvalidTitle), "long: {err:?}");
    assert!(repo.list(&ctx).expect("list").is_empty());

    repo.create(&ctx, &todo("1", "valid", false)).expect("create");
    let err = repo.update(&ctx, &todo("1", "", true)).unwrap_err();
    assert!(matches!(err, TodoError::InvalidTitle), "update: {err:?}");
    assert_eq!(repo.get(&ctx, "1").expect("get"), todo("1", "valid", false));
}

// ============================================================================
// Cancellation
// ============================================================================

/// A cancelled context fails every operation without touching the store.
pub fn cancelled_context_fails_fast<R: TodoRepository>(repo: &R) {
    let live = Context::background();
    repo.create(&live, &todo("1", "existing", false)).expect("create");

    let ctx = Context::background();
    ctx.cancel();
    assert!(matches!(repo.list(&ctx), Err(TodoError::Cancelled)));
    assert!(matches!(repo.get(&ctx, "1"), Err(TodoError::Cancelled)));
    assert!(matches!(
        repo.create(&ctx, &todo("2", "new", false)),
        Err(TodoError::Cancelled)
    ));
    assert!(matches!(
        repo.update(&ctx, &todo("1", "changed", true)),
        Err(TodoError::Cancelled)
    ));
    assert!(matches!(repo.delete(&ctx, "1"), Err(TodoError::Cancelled)));

    assert_eq!(repo.list(&live).expect("list"), vec![todo("1", "existing", false)]);
}

/// An expired deadline surfaces as `Timeout`.
pub fn expired_deadline_times_out<R: TodoRepository>(repo: &R) {
    let ctx = Context::with_timeout(Duration::ZERO);
    assert!(matches!(repo.list(&ctx), Err(TodoError::Timeout)));
    assert!(matches!(
        repo.create(&ctx, &todo("1", "late", false)),
        Err(TodoError::Timeout)
    ));
    assert!(repo.list(&Context::background()).expect("list").is_empty());
}

// ============================================================================
// Concurrent
// ============================================================================

/// Of several racing creates for one id, exactly one succeeds.
pub fn concurrent_creates_one_wins<R: TodoRepository>(repo: &R) {
    const WRITERS: usize = 8;

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|n| {
                scope.spawn(move || {
                    repo.create(
                        &Context::background(),
                        &todo("race", &format!("writer {n}"), false),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("writer thread panicked"))
            .collect()
    });

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(TodoError::Conflict { .. })))
        .count();
    assert_eq!(wins, 1, "results: {results:?}");
    assert_eq!(conflicts, WRITERS - 1, "results: {results:?}");
    assert_eq!(repo.list(&Context::background()).expect("list").len(), 1);
}

/// Runs every check, each against a fresh repository from `make`.
pub fn run_all<R, F>(make: F)
where
    R: TodoRepository,
    F: Fn() -> R,
{
    // CRUD
    create_then_get_round_trips(&make());
    update_replaces_wholesale(&make());
    delete_removes_record(&make());

    // Existence
    create_twice_conflicts(&make());
    get_missing_is_not_found(&make());
    update_missing_is_not_found(&make());
    delete_missing_is_not_found(&make());
    delete_twice_is_not_found(&make());

    // Listing
    list_empty_is_empty(&make());
    list_is_key_ordered(&make());

    // Pre-checks
    empty_id_is_rejected(&make());
    invalid_title_is_rejected(&make());

    // Cancellation
    cancelled_context_fails_fast(&make());
    expired_deadline_times_out(&make());

    // Concurrent
    concurrent_creates_one_wins(&make());
}
