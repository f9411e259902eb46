//! Storage error taxonomy.

use thiserror::Error;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Outcome of a store operation that did not succeed.
///
/// `Unavailable` is the infrastructure-failure arm: a pool timeout or lost
/// connection during an authorization read must surface as this, never as a
/// deny. Denying access and failing to check access are different things.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The referenced entity does not exist. Carries the entity kind for
    /// diagnostics ("role", "identity", "parish", ...).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness invariant on a name was violated.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// The (identity, role) pair already exists in the ledger.
    #[error("role is already assigned to this identity")]
    AlreadyAssigned,

    /// The store itself failed (unavailable, timeout, corrupt row).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
