use crate::array::error::ArrayError;

pub fn num_elements(shape: &[usize]) -> Result<usize, ArrayError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ArrayError::ShapeOverflow)
}

/// Fill `strides` with the exclusive right-to-left running product of `shape`.
pub fn write_row_major_strides(shape: &[usize], strides: &mut [usize]) {
    debug_assert_eq!(shape.len(), strides.len());
    let mut acc = 1usize;
    for (stride, &dim) in strides.iter_mut().zip(shape).rev() {
        *stride = acc;
        acc = acc.wrapping_mul(dim);
    }
}

/// Flat offset of a (possibly partial) multi-index.
///
/// `index` may be shorter than `shape`; the trailing axes are then treated as
/// zero. Returns `None` if the index is longer than the rank or any component
/// is out of range for its axis.
#[inline]
pub fn prefix_offset(index: &[usize], shape: &[usize], strides: &[usize]) -> Option<usize> {
    if index.len() > shape.len() {
        return None;
    }
    index
        .iter()
        .zip(shape.iter().zip(strides))
        .try_fold(0usize, |acc, (&i, (&dim, &stride))| {
            (i < dim).then(|| acc + i * stride)
        })
}
