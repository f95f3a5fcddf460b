use thiserror::Error;

/// Core error type shared across gdbcheck crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The store cannot be opened or enumerated. Fatal to a validation run.
    #[error("store access error: {0}")]
    StoreAccess(String),
    /// A single entity could not be scanned. Recovered by the indexer.
    #[error("entity read error: {entity}: {message}")]
    EntityRead { entity: String, message: String },
    /// The schema registry violates internal invariants.
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::EntityRead`] for the named entity.
    pub fn entity_read(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EntityRead {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for results returned by gdbcheck crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_read_names_the_entity() {
        let err = Error::entity_read("LocalNotes", "permission denied");
        assert_eq!(err.to_string(), "entity read error: LocalNotes: permission denied");
    }
}
