//! ID generator port for backend-assigned identifiers.

/// Generates unique identifiers for issues and comments.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
