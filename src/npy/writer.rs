use std::io::Write;

use crate::{
    array::{ArrayError, Dimension, StridedArray, WritableElement, util::num_elements},
    npy::{
        error::NpyError,
        header::{Header, Version},
    },
};

/// Write `array` as a complete `.npy` stream.
///
/// The `descr` is the host byte order plus the kind and width of `T`; elements are written in
/// row-major order. `version = None` picks the smallest version whose length field fits the
/// header. Returns the version written.
///
/// # Errors
/// - [`NpyError::Size`] if the array's buffer doesn't hold `product(shape)` elements (a default
///   scalar or dynamic-rank array).
/// - [`NpyError::Capacity`] if the header is too long for the requested version.
pub fn write_npy<T, D, W>(
    writer: &mut W,
    array: &StridedArray<T, D>,
    version: Option<Version>,
) -> Result<Version, NpyError>
where
    T: WritableElement,
    D: Dimension,
    W: Write,
{
    let expected = num_elements(array.shape())?;
    if expected != array.len() {
        return Err(ArrayError::WrongElementCount {
            expected,
            actual: array.len(),
        }
        .into());
    }

    let header = Header::for_array(array);
    let (version, mut buf) = header.to_bytes(version)?;
    let header_len = buf.len();
    buf.reserve(array.len() * T::TYPE.byte_width());
    for value in array.iter() {
        value.put_ne_bytes(&mut buf);
    }
    writer.write_all(&buf)?;

    tracing::debug!(
        %version,
        descr = %header.descr,
        shape = ?array.shape(),
        header_len,
        payload_len = buf.len() - header_len,
        "wrote npy array"
    );
    Ok(version)
}
