//! Live adapter for the `IdGenerator` port.

use uuid::Uuid;

use crate::ports::IdGenerator;

/// Prefix of every generated identifier.
pub const ID_PREFIX: &str = "bd";

/// Random identifiers of the form `bd-<12 hex digits>`.
#[derive(Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate_id(&self) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{ID_PREFIX}-{}", &hex[..12])
    }
}
