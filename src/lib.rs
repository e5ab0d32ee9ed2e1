//! Strided N-dimensional arrays and a `.npy` codec.
//!
//! [`StridedArray`] stores elements in one row-major buffer with a shape and strides. Its rank
//! is either fixed at compile time ([`Ix<N>`](array::Ix)) or carried at runtime
//! ([`IxDyn`](array::IxDyn)). Arrays can share their buffer with views of a different shape.
//!
//! The [`npy`] module reads and writes the NumPy `.npy` format, versions 1.0 and 2.0:
//!
//! ```rust,no_run
//! use npstride::{StridedArray, npy::{self, NpyFile, Mode}};
//!
//! let arr = StridedArray::<f64, _>::from_shape_fn((2usize, 3usize), |ix| (ix[0] * 3 + ix[1]) as f64);
//! npy::save_npy("a.npy", &arr)?;
//!
//! let mut file = NpyFile::open("a.npy", Mode::Read)?;
//! let back = file.load::<f64>()?;
//! file.close()?;
//! assert_eq!(back, arr);
//! # Ok::<(), npy::NpyError>(())
//! ```
pub mod array;
pub mod consts;
pub mod dtype;
pub mod npy;

pub use array::{ArrayD, ArrayError, Dimension, Element, IxDyn, StridedArray, WritableElement};
pub use dtype::{DataType, TypeKind};
pub use npy::{Mode, NpyError, NpyFile};
