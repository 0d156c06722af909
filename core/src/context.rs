//! Cooperative cancellation for todo operations.
//!
//! A [`Context`] travels with every repository and service call. It is
//! checked when an operation starts and, for scans, between records. A fired
//! signal turns into an immediate [`TodoError::Cancelled`] or
//! [`TodoError::Timeout`]; a transaction already committing is not
//! interrupted.

use crate::error::{TodoError, TodoResult};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline.
///
/// Cloning shares the token: cancelling any clone cancels them all.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent means no deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::background().deadline_at(deadline),
            None => Self::background(),
        }
    }

    /// A context driven by an existing cancellation token.
    #[must_use]
    pub const fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Returns the context with its deadline set to `deadline`.
    ///
    /// An earlier existing deadline is kept.
    #[must_use]
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fires the cancellation signal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A child context: cancelled with its parent, but cancelling it does not
    /// affect the parent. The deadline is inherited.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Fails if the signal fired or the deadline passed.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Cancelled`] once the token is cancelled, otherwise
    /// [`TodoError::Timeout`] once the deadline has passed.
    pub fn check(&self) -> TodoResult<()> {
        if self.token.is_cancelled() {
            return Err(TodoError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(TodoError::Timeout);
        }
        Ok(())
    }
}
