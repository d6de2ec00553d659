/// Errors reported by the collections in this crate.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A keyed accessor was asked for a key that is not in the map.
    #[error("key not found")]
    KeyNotFound,
    /// Storage for a new node could not be acquired.
    #[error("failed to allocate storage for a new node")]
    AllocationFailure,
    /// A red-black property or a structural link does not hold. Only produced by
    /// `RedBlackTree::check_invariants`.
    #[error("red-black invariant violated: {0}")]
    InvariantViolation(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
