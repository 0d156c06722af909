//! Identifier generation.

use std::sync::Arc;

/// Produces a fresh opaque identifier on every call.
///
/// Collisions must be negligible. An empty return value is treated as a fatal
/// internal error by the service.
///
/// # Examples
///
/// ```
/// use todokv_core::IdGenerator;
///
/// struct Fixed;
///
/// impl IdGenerator for Fixed {
///     fn new_id(&self) -> String {
///         "id-1".to_string()
///     }
/// }
///
/// assert_eq!(Fixed.new_id(), "id-1");
/// ```
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier.
    fn new_id(&self) -> String;
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn new_id(&self) -> String {
        (**self).new_id()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &G {
    fn new_id(&self) -> String {
        (**self).new_id()
    }
}
