use thiserror::Error;

/// Errors returned by shape-changing [`StridedArray`](crate::array::StridedArray) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// `product(shape)` overflowed `usize`.
    #[error("shape element count overflow")]
    ShapeOverflow,
    /// A reshape or shared view asked for a different number of elements.
    #[error("size mismatch: array holds {expected} elements, new shape holds {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    /// A fixed-rank array was given a shape of another length.
    #[error("rank mismatch: expected rank {expected}, got {actual}")]
    RankMismatch { expected: usize, actual: usize },
    /// The number of provided elements doesn't match `product(shape)`.
    #[error("wrong element count: expected {expected}, got {actual}")]
    WrongElementCount { expected: usize, actual: usize },
    /// Converting from an `ndarray` requires standard layout (contiguous, row-major).
    #[error("ndarray is not standard layout")]
    NonContiguousNdarray,
}
