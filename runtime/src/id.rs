//! Production identifier generation.

use todokv_core::IdGenerator;
use uuid::Uuid;

/// Generates random UUID v4 identifiers in hyphenated form.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
