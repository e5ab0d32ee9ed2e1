//! Shape containers for fixed and dynamic rank.
//!
//! A [`StridedArray`](crate::array::StridedArray) is generic over the container that holds its
//! shape and strides:
//! - [`Ix<N>`] (`[usize; N]`) fixes the rank at compile time.
//! - [`IxDyn`] (`SmallVec<[usize; 4]>`) carries the rank at runtime.
//!
//! [`IntoShape`] turns the usual ways of spelling a shape (arrays, tuples, vectors, slices) into
//! one of those containers, and [`NdIndex`] does the same for element indices.
use std::fmt::Debug;

use smallvec::SmallVec;

use crate::array::{error::ArrayError, util::prefix_offset};

/// Fixed-rank shape.
pub type Ix<const N: usize> = [usize; N];
/// Dynamic-rank shape.
pub type IxDyn = SmallVec<[usize; 4]>;

pub type Ix0 = Ix<0>;
pub type Ix1 = Ix<1>;
pub type Ix2 = Ix<2>;
pub type Ix3 = Ix<3>;
pub type Ix4 = Ix<4>;

pub trait Dimension: Clone + Debug + PartialEq + Eq + AsRef<[usize]> + AsMut<[usize]> {
    /// Compile-time rank, `None` for dynamic rank.
    const RANK: Option<usize>;

    /// Build a shape from runtime dimensions, checking the rank for fixed-rank containers.
    fn from_dims(dims: &[usize]) -> Result<Self, ArrayError>;

    /// The shape of a default-constructed (empty) array.
    fn empty() -> Self;

    /// A zero-filled container with the same rank as `self`.
    fn zeros_like(&self) -> Self;

    fn ndim(&self) -> usize {
        self.as_ref().len()
    }
}

impl<const N: usize> Dimension for [usize; N] {
    const RANK: Option<usize> = Some(N);

    fn from_dims(dims: &[usize]) -> Result<Self, ArrayError> {
        <[usize; N]>::try_from(dims).map_err(|_| ArrayError::RankMismatch {
            expected: N,
            actual: dims.len(),
        })
    }

    fn empty() -> Self {
        [0; N]
    }

    fn zeros_like(&self) -> Self {
        [0; N]
    }
}

impl Dimension for IxDyn {
    const RANK: Option<usize> = None;

    fn from_dims(dims: &[usize]) -> Result<Self, ArrayError> {
        Ok(SmallVec::from_slice(dims))
    }

    fn empty() -> Self {
        SmallVec::new()
    }

    fn zeros_like(&self) -> Self {
        SmallVec::from_elem(0, self.len())
    }
}

/// Conversion into a shape container.
///
/// Arrays, tuples, `usize` and `()` produce fixed-rank shapes; vectors and slices produce
/// dynamic-rank shapes.
pub trait IntoShape {
    type Dim: Dimension;

    fn into_shape(self) -> Self::Dim;
}

impl<const N: usize> IntoShape for [usize; N] {
    type Dim = [usize; N];

    fn into_shape(self) -> Self::Dim {
        self
    }
}

impl<const N: usize> IntoShape for &[usize; N] {
    type Dim = [usize; N];

    fn into_shape(self) -> Self::Dim {
        *self
    }
}

impl IntoShape for () {
    type Dim = [usize; 0];

    fn into_shape(self) -> Self::Dim {
        []
    }
}

impl IntoShape for usize {
    type Dim = [usize; 1];

    fn into_shape(self) -> Self::Dim {
        [self]
    }
}

impl IntoShape for Vec<usize> {
    type Dim = IxDyn;

    fn into_shape(self) -> Self::Dim {
        SmallVec::from_vec(self)
    }
}

impl IntoShape for &[usize] {
    type Dim = IxDyn;

    fn into_shape(self) -> Self::Dim {
        SmallVec::from_slice(self)
    }
}

impl IntoShape for IxDyn {
    type Dim = IxDyn;

    fn into_shape(self) -> Self::Dim {
        self
    }
}

/// Anything that addresses an element (or a sub-array's first element) of a strided array.
///
/// Indices shorter than the rank are allowed and address the first element of the sub-array
/// obtained by fixing the leading axes.
pub trait NdIndex {
    /// Flat buffer offset for this index, or `None` if it is out of bounds.
    fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize>;
}

impl<const N: usize> NdIndex for [usize; N] {
    #[inline]
    fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize> {
        prefix_offset(self, shape, strides)
    }
}

impl NdIndex for &[usize] {
    #[inline]
    fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize> {
        prefix_offset(self, shape, strides)
    }
}

impl NdIndex for IxDyn {
    #[inline]
    fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize> {
        prefix_offset(self, shape, strides)
    }
}

impl NdIndex for () {
    #[inline]
    fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize> {
        prefix_offset(&[], shape, strides)
    }
}

impl NdIndex for usize {
    #[inline]
    fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize> {
        prefix_offset(&[*self], shape, strides)
    }
}

macro_rules! impl_tuple_shape {
    (@usize $name:ident) => {
        usize
    };
    ($n:literal; $($name:ident),+) => {
        impl IntoShape for ($(impl_tuple_shape!(@usize $name),)+) {
            type Dim = [usize; $n];

            fn into_shape(self) -> Self::Dim {
                let ($($name,)+) = self;
                [$($name),+]
            }
        }

        impl NdIndex for ($(impl_tuple_shape!(@usize $name),)+) {
            #[inline]
            fn offset_in(&self, shape: &[usize], strides: &[usize]) -> Option<usize> {
                let ($($name,)+) = *self;
                prefix_offset(&[$($name),+], shape, strides)
            }
        }
    };
}

impl_tuple_shape!(1; a);
impl_tuple_shape!(2; a, b);
impl_tuple_shape!(3; a, b, c);
impl_tuple_shape!(4; a, b, c, d);
impl_tuple_shape!(5; a, b, c, d, e);
impl_tuple_shape!(6; a, b, c, d, e, f);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_from_dims_checks_rank() {
        assert_eq!(<Ix3 as Dimension>::from_dims(&[1, 2, 3]), Ok([1, 2, 3]));
        assert_eq!(
            <Ix3 as Dimension>::from_dims(&[1, 2]),
            Err(ArrayError::RankMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn dyn_from_dims_accepts_any_rank() {
        let d = <IxDyn as Dimension>::from_dims(&[4, 5, 6, 7, 8]).unwrap();
        assert_eq!(d.as_slice(), &[4, 5, 6, 7, 8]);
        assert_eq!(IxDyn::RANK, None);
        assert_eq!(Ix2::RANK, Some(2));
    }

    #[test]
    fn tuples_and_scalars_become_fixed_shapes() {
        assert_eq!((2usize, 3usize, 4usize).into_shape(), [2, 3, 4]);
        assert_eq!(7usize.into_shape(), [7]);
        assert_eq!(().into_shape(), [0usize; 0]);
        assert_eq!(vec![2usize, 3].into_shape().as_slice(), &[2, 3]);
    }

    #[test]
    fn tuple_index_matches_array_index() {
        let shape = [2, 3, 4];
        let strides = [12, 4, 1];
        assert_eq!(
            (1usize, 2usize, 3usize).offset_in(&shape, &strides),
            [1usize, 2, 3].offset_in(&shape, &strides)
        );
        assert_eq!((1usize, 2usize).offset_in(&shape, &strides), Some(20));
        assert_eq!(().offset_in(&shape, &strides), Some(0));
        assert_eq!(5usize.offset_in(&shape, &strides), None);
    }
}
