//! The `Todo` entity and its validation rule.

use crate::error::{TodoError, TodoResult};
use serde::{Deserialize, Serialize};

/// Maximum title length, counted in characters after trimming.
pub const MAX_TITLE_LEN: usize = 200;

/// A single todo item.
///
/// The `id` is assigned once at creation and doubles as the storage key.
/// `title` and `completed` are replaced wholesale on update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Opaque unique identifier
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Whether the todo is done
    pub completed: bool,
}

impl Todo {
    /// Creates a new, not yet completed todo.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
        }
    }

    /// Returns the todo with its completion flag set to `completed`.
    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Checks the entity invariants.
    ///
    /// Only the title is checked here; identifier presence is enforced by the
    /// operations that need one (see [`require_id`]).
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::InvalidTitle`] if the trimmed title is empty or
    /// longer than [`MAX_TITLE_LEN`] characters.
    pub fn validate(&self) -> TodoResult<()> {
        validate_title(&self.title)
    }
}

/// Validates a title against the non-blank and length rule.
///
/// # Errors
///
/// Returns [`TodoError::InvalidTitle`] if the trimmed title is empty or
/// longer than [`MAX_TITLE_LEN`] characters.
pub fn validate_title(title: &str) -> TodoResult<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(TodoError::InvalidTitle);
    }
    Ok(())
}

/// Rejects an empty identifier.
///
/// # Errors
///
/// Returns [`TodoError::MissingId`] if `id` is empty.
pub fn require_id(id: &str) -> TodoResult<()> {
    if id.is_empty() {
        return Err(TodoError::MissingId);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_title_required() {
        let todo = Todo::new("x", "   ");
        assert!(matches!(todo.validate(), Err(TodoError::InvalidTitle)));
    }

    #[test]
    fn test_title_max_len() {
        let todo = Todo::new("x", "a".repeat(MAX_TITLE_LEN + 1));
        assert!(matches!(todo.validate(), Err(TodoError::InvalidTitle)));

        let todo = Todo::new("x", "a".repeat(MAX_TITLE_LEN));
        assert!(todo.validate().is_ok());
    }

    #[test]
    fn test_surrounding_whitespace_not_counted() {
        let title = format!("  {}\t\n", "a".repeat(MAX_TITLE_LEN));
        assert!(validate_title(&title).is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 200 two-byte characters is 400 bytes but still a valid title
        let title = "é".repeat(MAX_TITLE_LEN);
        assert!(validate_title(&title).is_ok());
    }

    #[test]
    fn test_valid_todo() {
        let todo = Todo::new("x", "buy milk").with_completed(true);
        assert!(todo.validate().is_ok());
        assert!(todo.completed);
    }

    #[test]
    fn test_require_id() {
        assert!(matches!(require_id(""), Err(TodoError::MissingId)));
        assert!(require_id("id-1").is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let todo = Todo::new("id-1", "buy milk");
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "id-1", "title": "buy milk", "completed": false})
        );
    }

    proptest! {
        #[test]
        fn prop_validate_matches_trimmed_length(title in "\\PC{0,260}") {
            let len = title.trim().chars().count();
            let expected_ok = len > 0 && len <= MAX_TITLE_LEN;
            prop_assert_eq!(validate_title(&title).is_ok(), expected_ok);
        }

        #[test]
        fn prop_blank_titles_rejected(title in "[ \\t\\r\\n]{0,40}") {
            prop_assert!(matches!(validate_title(&title), Err(TodoError::InvalidTitle)));
        }
    }
}
