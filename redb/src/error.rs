//! Mapping of redb failures onto the todo error taxonomy.

use todokv_core::TodoError;

/// Converts any redb error into a [`TodoError`].
///
/// A held file lock becomes `Busy`; a missing bucket and every other storage
/// failure become `Internal`, keeping the redb error as source.
pub(crate) fn storage(err: impl Into<redb::Error>) -> TodoError {
    match err.into() {
        redb::Error::DatabaseAlreadyOpen => {
            TodoError::busy("database file is locked by another owner")
        }
        redb::Error::TableDoesNotExist(name) => {
            TodoError::internal(format!("bucket {name:?} not found"))
        }
        other => TodoError::internal_with_source("storage failure", other),
    }
}
