//! Status codes shared by every fallible engine operation.

use std::collections::TryReserveError;

use thiserror::Error;

/// Engine-wide error kinds. Mutating operations either complete fully or
/// leave all world invariants intact before returning one of these.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// Malformed configuration, non-unit delta, or misuse of a context handle.
    #[error("invalid argument")]
    InvalidArgument,
    /// Chunk not loaded, material id not registered, or empty source cell.
    #[error("not found")]
    NotFound,
    /// Chunk already loaded at these coordinates, or duplicate material name.
    #[error("already exists")]
    AlreadyExists,
    /// Material registry full, or the chunk registry cannot grow further.
    #[error("capacity reached")]
    CapacityReached,
    /// The allocator returned no memory.
    #[error("allocation failed")]
    AllocationFailed,
    /// Cell-index validation failure (debug paths).
    #[error("out of bounds")]
    OutOfBounds,
    /// A context operation is impossible: no viable target, STATIC target,
    /// or a second mutating call in one hook invocation.
    #[error("conflict")]
    Conflict,
    /// Payload larger than the world's inline budget, or the operation is
    /// not implementable under the current configuration.
    #[error("unsupported")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::AllocationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_status_wording() {
        assert_eq!(Error::InvalidArgument.to_string(), "invalid argument");
        assert_eq!(Error::CapacityReached.to_string(), "capacity reached");
        assert_eq!(Error::Conflict.to_string(), "conflict");
    }
}
