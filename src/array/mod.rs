//! Strided N-dimensional arrays.
//!
//! This module provides [`StridedArray`], a flat element buffer plus a shape and row-major
//! strides. The shape container is a type parameter, so one type covers both fixed rank
//! ([`Ix<N>`]) and dynamic rank ([`IxDyn`]).
//!
//! ## Buffer ownership
//! The buffer is an `Rc<[Cell<T>]>`:
//! - [`Clone`] deep-copies the buffer; the copy is independent of the source.
//! - [`StridedArray::share_as`] creates a *shared view*: a second array with its own shape and
//!   strides that co-owns the same buffer. Writes through either are visible through the other,
//!   and the buffer is freed when the last holder is dropped.
//! - Moving an array transfers the buffer. `std::mem::take` leaves the source in the default
//!   (empty) state.
//!
//! Elements are read and written through `Cell`, so shared views never hand out aliasing
//! `&mut T`. Because the buffer is reference counted with `Rc`, arrays are neither `Send` nor
//! `Sync`: shared buffers cannot be touched from more than one thread.
//!
//! ## Indexing
//! An index may be shorter than the rank. The flat offset is always
//! `sum(strides[i] * index[i] for i < index.len())`, so a partial index addresses the first
//! element of the sub-array with the leading axes fixed. Every index component must be within
//! its axis.
//!
//! ```rust,ignore
//! let mut arr = StridedArray::<i32, Ix4>::from_shape([2, 3, 4, 5]);
//! arr.set((1, 2, 3, 4), 7);
//! assert_eq!(arr[(1, 2, 3, 4)].get(), 7);
//!
//! let view = arr.share_as([6, 4, 5])?;
//! assert_eq!(view.get([5, 3, 4]), Some(7));
//! ```
use std::{
    cell::Cell,
    fmt,
    ops::Index,
    rc::Rc,
};

use crate::{
    array::util::{num_elements, write_row_major_strides},
    dtype::DataType,
};

pub mod dimension;
pub mod element;
pub mod error;
pub mod util;

pub use dimension::{Dimension, IntoShape, Ix, Ix0, Ix1, Ix2, Ix3, Ix4, IxDyn, NdIndex};
pub use element::{Element, WritableElement};
pub use error::ArrayError;

/// Dynamic-rank array.
pub type ArrayD<T> = StridedArray<T, IxDyn>;

/// An N-dimensional array with row-major contiguous strides.
pub struct StridedArray<T, D: Dimension = IxDyn> {
    buffer: Option<Rc<[Cell<T>]>>,
    len: usize,
    shape: D,
    strides: D,
}

fn row_major_strides<D: Dimension>(shape: &D) -> D {
    let mut strides = shape.zeros_like();
    write_row_major_strides(shape.as_ref(), strides.as_mut());
    strides
}

impl<T, D: Dimension> Default for StridedArray<T, D> {
    /// An empty array: no buffer, zero elements.
    fn default() -> Self {
        Self {
            buffer: None,
            len: 0,
            shape: D::empty(),
            strides: D::empty(),
        }
    }
}

impl<T: Element, D: Dimension> StridedArray<T, D> {
    fn from_parts(shape: D, len: usize, buffer: Rc<[Cell<T>]>) -> Self {
        debug_assert_eq!(buffer.len(), len);
        let strides = row_major_strides(&shape);
        Self {
            buffer: Some(buffer),
            len,
            shape,
            strides,
        }
    }

    /// Create an array of `shape` filled with `T::default()`.
    ///
    /// # Panics
    /// Panics if the element count of `shape` overflows `usize`.
    pub fn from_shape<S: IntoShape<Dim = D>>(shape: S) -> Self {
        Self::from_elem(shape, T::default())
    }

    /// Create an array of `shape` filled with `value`.
    ///
    /// # Panics
    /// Panics if the element count of `shape` overflows `usize`.
    pub fn from_elem<S: IntoShape<Dim = D>>(shape: S, value: T) -> Self {
        match Self::try_from_elem(shape, value) {
            Ok(arr) => arr,
            Err(e) => panic!("invalid array shape: {e}"),
        }
    }

    /// Create an array of `shape` filled with `value`, returning a structured error instead of
    /// panicking.
    pub fn try_from_elem<S: IntoShape<Dim = D>>(shape: S, value: T) -> Result<Self, ArrayError> {
        let shape = shape.into_shape();
        let len = num_elements(shape.as_ref())?;
        let buffer: Rc<[Cell<T>]> = (0..len).map(|_| Cell::new(value)).collect();
        Ok(Self::from_parts(shape, len, buffer))
    }

    /// Create an array from runtime dimensions.
    ///
    /// For fixed-rank arrays this checks that `dims` has the right length.
    pub fn try_from_dims(dims: &[usize]) -> Result<Self, ArrayError> {
        let shape = D::from_dims(dims)?;
        let len = num_elements(shape.as_ref())?;
        let buffer: Rc<[Cell<T>]> = (0..len).map(|_| Cell::new(T::default())).collect();
        Ok(Self::from_parts(shape, len, buffer))
    }

    /// Create an array from elements in row-major order.
    ///
    /// # Errors
    /// Returns [`ArrayError::WrongElementCount`] if `data.len()` differs from the element count
    /// implied by `shape`.
    pub fn from_shape_vec<S: IntoShape<Dim = D>>(shape: S, data: Vec<T>) -> Result<Self, ArrayError> {
        let shape = shape.into_shape();
        let len = num_elements(shape.as_ref())?;
        if data.len() != len {
            return Err(ArrayError::WrongElementCount {
                expected: len,
                actual: data.len(),
            });
        }
        let buffer: Rc<[Cell<T>]> = data.into_iter().map(Cell::new).collect();
        Ok(Self::from_parts(shape, len, buffer))
    }

    /// Create an array by evaluating `f` at every multi-index in row-major order.
    pub fn from_shape_fn<S, F>(shape: S, mut f: F) -> Self
    where
        S: IntoShape<Dim = D>,
        F: FnMut(&[usize]) -> T,
    {
        let shape = shape.into_shape();
        let dims = shape.as_ref();
        let len = match num_elements(dims) {
            Ok(n) => n,
            Err(e) => panic!("invalid array shape: {e}"),
        };
        let mut idx = shape.zeros_like();
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(Cell::new(f(idx.as_ref())));
            let idx = idx.as_mut();
            for d in (0..dims.len()).rev() {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        let buffer: Rc<[Cell<T>]> = data.into();
        Self::from_parts(shape, len, buffer)
    }

    /// Number of elements (`product(shape)`, 1 for a scalar, 0 for a default array).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Alias for [`Self::len`].
    pub fn element_count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn shape(&self) -> &[usize] {
        self.shape.as_ref()
    }

    /// The shape in its typed container.
    pub fn dim(&self) -> &D {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        self.strides.as_ref()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Alias for [`Self::ndim`].
    pub fn rank(&self) -> usize {
        self.ndim()
    }

    pub const fn data_type(&self) -> DataType {
        T::TYPE
    }

    /// The element cells in row-major order.
    pub fn cells(&self) -> &[Cell<T>] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    /// Flat buffer offset of `index`, or `None` if it is out of bounds.
    #[inline]
    pub fn offset_of<I: NdIndex>(&self, index: I) -> Option<usize> {
        index.offset_in(self.shape.as_ref(), self.strides.as_ref())
    }

    /// The cell addressed by `index`.
    ///
    /// Every read and write path goes through this lookup.
    #[inline]
    pub fn cell<I: NdIndex>(&self, index: I) -> Option<&Cell<T>> {
        let offset = self.offset_of(index)?;
        self.cells().get(offset)
    }

    /// Read the element at `index`.
    #[inline]
    pub fn get<I: NdIndex>(&self, index: I) -> Option<T> {
        self.cell(index).map(Cell::get)
    }

    /// Write the element at `index`. Returns `None` if `index` is out of bounds.
    ///
    /// The write is visible through every shared view of this buffer.
    #[inline]
    pub fn set<I: NdIndex>(&self, index: I, value: T) -> Option<()> {
        self.cell(index).map(|c| c.set(value))
    }

    /// Mutable access to the element at `index`.
    ///
    /// Only available while this array is the sole owner of its buffer; returns `None` if the
    /// buffer is shared with a view or `index` is out of bounds.
    pub fn get_mut<I: NdIndex>(&mut self, index: I) -> Option<&mut T> {
        let offset = self.offset_of(index)?;
        let cells = Rc::get_mut(self.buffer.as_mut()?)?;
        cells.get_mut(offset).map(Cell::get_mut)
    }

    /// Iterate over the elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.cells().iter().map(Cell::get)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn fill(&self, value: T) {
        for cell in self.cells() {
            cell.set(value);
        }
    }

    /// Reinterpret the buffer under a new shape without moving data.
    ///
    /// The shape may be given in any form; fixed-rank arrays check that it has the same rank.
    ///
    /// # Errors
    /// - [`ArrayError::SizeMismatch`] if the new shape holds a different number of elements.
    /// - [`ArrayError::RankMismatch`] if a fixed-rank array is given a shape of another rank.
    pub fn reshape<S: IntoShape>(&mut self, shape: S) -> Result<(), ArrayError> {
        let shape = D::from_dims(shape.into_shape().as_ref())?;
        let len = num_elements(shape.as_ref())?;
        if len != self.len {
            return Err(ArrayError::SizeMismatch {
                expected: self.len,
                actual: len,
            });
        }
        self.strides = row_major_strides(&shape);
        self.shape = shape;
        Ok(())
    }

    /// Create a shared view of this array's buffer under `shape`.
    ///
    /// The view co-owns the buffer, has its own shape and strides, and sees every write made
    /// through this array (and vice versa). The rank of the view follows from the shape type, so
    /// a `(2, 3, 4, 5)` array can be viewed as `[6, 4, 5]`.
    ///
    /// # Errors
    /// Returns [`ArrayError::SizeMismatch`] if `shape` holds a different number of elements.
    pub fn share_as<S: IntoShape>(&self, shape: S) -> Result<StridedArray<T, S::Dim>, ArrayError> {
        let shape = shape.into_shape();
        let len = num_elements(shape.as_ref())?;
        if len != self.len {
            return Err(ArrayError::SizeMismatch {
                expected: self.len,
                actual: len,
            });
        }
        let strides = row_major_strides(&shape);
        Ok(StridedArray {
            buffer: self.buffer.clone(),
            len,
            shape,
            strides,
        })
    }

    /// Number of arrays holding this buffer (0 for a default array).
    pub fn share_count(&self) -> usize {
        self.buffer.as_ref().map_or(0, Rc::strong_count)
    }

    pub fn is_shared(&self) -> bool {
        self.share_count() > 1
    }

    /// Whether both arrays hold the same buffer.
    pub fn ptr_eq<E: Dimension>(&self, other: &StridedArray<T, E>) -> bool {
        match (&self.buffer, &other.buffer) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert to a dynamic-rank array, keeping the buffer.
    pub fn into_dyn(self) -> StridedArray<T, IxDyn> {
        StridedArray {
            buffer: self.buffer,
            len: self.len,
            shape: IxDyn::from_slice(self.shape.as_ref()),
            strides: IxDyn::from_slice(self.strides.as_ref()),
        }
    }

    /// Convert to another shape container, keeping the buffer.
    ///
    /// # Errors
    /// Returns [`ArrayError::RankMismatch`] if `E` has a fixed rank different from this array's.
    pub fn into_dimensionality<E: Dimension>(self) -> Result<StridedArray<T, E>, ArrayError> {
        if self.buffer.is_none() {
            return Ok(StridedArray::default());
        }
        if let Some(expected) = E::RANK {
            if expected != self.ndim() {
                return Err(ArrayError::RankMismatch {
                    expected,
                    actual: self.ndim(),
                });
            }
        }
        let shape = E::from_dims(self.shape.as_ref())?;
        let strides = row_major_strides(&shape);
        Ok(StridedArray {
            buffer: self.buffer,
            len: self.len,
            shape,
            strides,
        })
    }

    /// Copy into an owned `ndarray` array.
    pub fn to_ndarray(&self) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let data = self.to_vec();
        let actual = data.len();
        ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(self.shape()), data).map_err(|_| {
            ArrayError::WrongElementCount {
                expected: self.shape().iter().product(),
                actual,
            }
        })
    }
}

impl<T: Element> StridedArray<T, IxDyn> {
    /// Copy a standard-layout `ndarray` array into a new dynamic-rank array.
    ///
    /// # Errors
    /// Returns [`ArrayError::NonContiguousNdarray`] if `array` is not standard layout
    /// (contiguous, row-major), e.g. a transposed view.
    pub fn from_ndarray<S, Di>(array: &ndarray::ArrayBase<S, Di>) -> Result<Self, ArrayError>
    where
        S: ndarray::Data<Elem = T>,
        Di: ndarray::Dimension,
    {
        if !array.is_standard_layout() {
            return Err(ArrayError::NonContiguousNdarray);
        }
        let elems = array
            .as_slice_memory_order()
            .ok_or(ArrayError::NonContiguousNdarray)?;
        Self::from_shape_vec(array.shape(), elems.to_vec())
    }
}

impl<T: Element, D: Dimension> Clone for StridedArray<T, D> {
    /// Deep copy: the clone owns a fresh buffer.
    fn clone(&self) -> Self {
        Self {
            buffer: self
                .buffer
                .as_ref()
                .map(|cells| cells.iter().map(|c| Cell::new(c.get())).collect()),
            len: self.len,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
        }
    }
}

impl<T: Element, D: Dimension, E: Dimension> PartialEq<StridedArray<T, E>> for StridedArray<T, D> {
    fn eq(&self, other: &StridedArray<T, E>) -> bool {
        self.shape() == other.shape() && self.iter().eq(other.iter())
    }
}

impl<T: Element, D: Dimension, I: NdIndex> Index<I> for StridedArray<T, D> {
    type Output = Cell<T>;

    /// # Panics
    /// Panics if `index` is out of bounds.
    fn index(&self, index: I) -> &Cell<T> {
        match self.cell(index) {
            Some(cell) => cell,
            None => panic!("index out of bounds for shape {:?}", self.shape()),
        }
    }
}

impl<T: Element, D: Dimension> fmt::Debug for StridedArray<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedArray")
            .field("dtype", &T::TYPE)
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("shared", &self.share_count())
            .field("data", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_4d() -> StridedArray<i32, Ix4> {
        StridedArray::from_shape_fn([2, 3, 4, 5], |idx| {
            (idx[0] * 60 + idx[1] * 20 + idx[2] * 5 + idx[3]) as i32
        })
    }

    #[test]
    fn from_shape_computes_count_and_strides() {
        let arr = StridedArray::<i32, Ix4>::from_shape([2, 3, 4, 5]);
        assert_eq!(arr.len(), 120);
        assert_eq!(arr.ndim(), 4);
        assert_eq!(arr.strides(), &[60, 20, 5, 1]);
        assert!(arr.iter().all(|v| v == 0));
    }

    #[test]
    fn scalar_has_one_element() {
        let arr = StridedArray::<f64, Ix0>::from_shape(());
        assert_eq!(arr.len(), 1);
        assert_eq!(arr.ndim(), 0);
        arr.set((), 2.5);
        assert_eq!(arr[()].get(), 2.5);
    }

    #[test]
    fn default_is_empty() {
        let arr = StridedArray::<u8>::default();
        assert_eq!(arr.len(), 0);
        assert!(arr.shape().is_empty());
        assert_eq!(arr.share_count(), 0);
        assert_eq!(arr.get([0]), None);
    }

    #[test]
    fn partial_index_addresses_prefix_offset() {
        let arr = sequential_4d();
        for i in 0..2 {
            assert_eq!(arr.offset_of([i]), Some(i * 60));
            for j in 0..3 {
                assert_eq!(arr.offset_of((i, j)), Some(i * 60 + j * 20));
                assert_eq!(arr[(i, j)].get(), (i * 60 + j * 20) as i32);
            }
        }
        assert_eq!(arr.offset_of(()), Some(0));
    }

    #[test]
    fn out_of_range_component_is_rejected() {
        let arr = sequential_4d();
        // Flat offset 5 exists, but axis 3 only has 5 entries.
        assert_eq!(arr.get([0, 0, 0, 5]), None);
        assert_eq!(arr.get([0, 0, 0, 0, 0]), None);
        assert_eq!(arr.set([2, 0, 0, 0], 1), None);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_panics_out_of_bounds() {
        let arr = sequential_4d();
        let _ = arr[[1, 3, 0, 0]].get();
    }

    #[test]
    fn reshape_keeps_data() {
        let mut arr = sequential_4d();
        arr.reshape([1, 6, 4, 5]).unwrap();
        assert_eq!(arr.shape(), &[1, 6, 4, 5]);
        assert_eq!(arr.strides(), &[120, 20, 5, 1]);
        assert_eq!(arr[(0, 0, 0, 0)].get(), 0);
        assert_eq!(arr[(0, 5, 3, 4)].get(), 119);
    }

    #[test]
    fn reshape_rejects_size_and_rank_mismatch() {
        let mut arr = sequential_4d();
        assert_eq!(
            arr.reshape([2, 3, 4, 6]),
            Err(ArrayError::SizeMismatch {
                expected: 120,
                actual: 144
            })
        );
        assert_eq!(
            arr.reshape([6, 4, 5]),
            Err(ArrayError::RankMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(arr.shape(), &[2, 3, 4, 5]);
    }

    #[test]
    fn dyn_reshape_changes_rank() {
        let mut arr = sequential_4d().into_dyn();
        arr.reshape(vec![6, 20]).unwrap();
        assert_eq!(arr.ndim(), 2);
        assert_eq!(arr.get([5, 19]), Some(119));
    }

    #[test]
    fn shared_view_aliases_buffer() {
        let arr = sequential_4d();
        let view = arr.share_as([6, 4, 5]).unwrap();
        assert!(arr.ptr_eq(&view));
        assert_eq!(arr.share_count(), 2);
        assert_eq!(view.len(), arr.len());
        assert_eq!(view.strides(), &[20, 5, 1]);

        arr.set([1, 2, 3, 4], -1);
        assert_eq!(view.get([5, 3, 4]), Some(-1));
        view.set([0, 0, 1], -2);
        assert_eq!(arr.get([0, 0, 0, 1]), Some(-2));

        drop(arr);
        assert_eq!(view.share_count(), 1);
        assert_eq!(view.get([5, 3, 4]), Some(-1));
    }

    #[test]
    fn shared_view_rejects_size_mismatch() {
        let arr = sequential_4d();
        assert_eq!(
            arr.share_as([6, 4, 4]).unwrap_err(),
            ArrayError::SizeMismatch {
                expected: 120,
                actual: 96
            }
        );
        assert_eq!(arr.share_count(), 1);
    }

    #[test]
    fn get_mut_requires_unique_buffer() {
        let mut arr = sequential_4d();
        *arr.get_mut([1, 0, 0, 0]).unwrap() = 42;
        assert_eq!(arr[[1, 0, 0, 0]].get(), 42);

        let view = arr.share_as(120).unwrap();
        assert!(arr.get_mut([0, 0, 0, 0]).is_none());
        drop(view);
        assert!(arr.get_mut([0, 0, 0, 0]).is_some());
    }

    #[test]
    fn clone_is_deep() {
        let a = sequential_4d();
        let b = a.clone();
        assert!(!a.ptr_eq(&b));
        a.fill(0);
        assert_eq!(b.get([1, 2, 3, 4]), Some(119));
        b.set([0, 0, 0, 1], 9);
        assert_eq!(a.get([0, 0, 0, 1]), Some(0));
    }

    #[test]
    fn take_leaves_default() {
        let mut a = sequential_4d();
        let b = std::mem::take(&mut a);
        assert_eq!(a.len(), 0);
        assert_eq!(a.share_count(), 0);
        assert_eq!(b.len(), 120);
        assert_eq!(b.share_count(), 1);
    }

    #[test]
    fn into_dimensionality_checks_rank() {
        let arr = sequential_4d().into_dyn();
        let fixed: StridedArray<i32, Ix4> = arr.clone().into_dimensionality().unwrap();
        assert_eq!(fixed, arr);
        let err = arr.into_dimensionality::<Ix2>().unwrap_err();
        assert_eq!(
            err,
            ArrayError::RankMismatch {
                expected: 2,
                actual: 4
            }
        );
    }

    #[test]
    fn dynamic_target_accepts_any_rank() {
        let mut arr = sequential_4d().into_dyn();
        arr.reshape(vec![2, 60]).unwrap();
        let same: ArrayD<i32> = arr.clone().into_dimensionality().unwrap();
        assert_eq!(same, arr);
        let fixed = arr.into_dimensionality::<Ix2>().unwrap();
        assert_eq!(fixed.get([1, 59]), Some(119));
        let err = fixed.into_dimensionality::<Ix3>().unwrap_err();
        assert_eq!(
            err,
            ArrayError::RankMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn from_shape_vec_checks_count() {
        let err = StridedArray::<u16, Ix2>::from_shape_vec([2, 2], vec![1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            ArrayError::WrongElementCount {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn ndarray_interop() {
        let nd = ndarray::Array::from_shape_vec((2, 3), vec![1i32, 2, 3, 4, 5, 6]).unwrap();
        let arr = ArrayD::<i32>::from_ndarray(&nd).unwrap();
        assert_eq!(arr.shape(), &[2, 3]);
        assert_eq!(arr.get([1, 0]), Some(4));
        assert_eq!(arr.to_ndarray().unwrap(), nd.into_dyn());

        let base = ndarray::Array::from_shape_vec((2, 3), vec![1i32, 2, 3, 4, 5, 6]).unwrap();
        let t = base.view().reversed_axes();
        assert_eq!(
            ArrayD::<i32>::from_ndarray(&t).unwrap_err(),
            ArrayError::NonContiguousNdarray
        );
    }
}
