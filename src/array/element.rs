//! Element type definitions.
//!
//! [`Element`] describes how one array element maps onto the `.npy` payload: its logical
//! [`DataType`] (which fixes the `descr` kind and width) and how it is decoded from and encoded to
//! native-endian bytes.
//!
//! [`WritableElement`] marks the types that may be saved. `bool` is loadable but not writable,
//! so `save` on a boolean array is rejected at compile time.
use std::fmt::Debug;

use bytes::BufMut;
use num_complex::Complex;

use crate::dtype::DataType;

pub trait Element: Copy + Default + Debug + PartialEq + 'static {
    /// The logical datatype for this element.
    const TYPE: DataType;

    /// Decode one element from exactly `TYPE.byte_width()` native-endian bytes.
    ///
    /// Returns `None` if the bytes are not a valid encoding (e.g. a `bool` byte other than 0/1).
    fn from_ne_bytes(bytes: &[u8]) -> Option<Self>;

    /// Append the native-endian encoding of `self` to `buf`.
    fn put_ne_bytes<B: BufMut>(self, buf: &mut B);
}

/// Elements that have a `descr` the codec may write.
///
/// ```no_run
/// use npstride::{StridedArray, array::Ix1, npy};
///
/// let flags = StridedArray::<u8, Ix1>::from_elem(3usize, 1);
/// npy::save_npy("flags.npy", &flags)?;
/// # Ok::<(), npy::NpyError>(())
/// ```
///
/// `bool` is not writable:
///
/// ```compile_fail
/// use npstride::{StridedArray, array::Ix1, npy};
///
/// let flags = StridedArray::<bool, Ix1>::from_elem(3usize, true);
/// npy::save_npy("flags.npy", &flags)?;
/// # Ok::<(), npy::NpyError>(())
/// ```
pub trait WritableElement: Element {}

macro_rules! impl_element_numeric {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;

            #[inline]
            fn from_ne_bytes(bytes: &[u8]) -> Option<Self> {
                Some(<$ty>::from_ne_bytes(bytes.try_into().ok()?))
            }

            #[inline]
            fn put_ne_bytes<B: BufMut>(self, buf: &mut B) {
                buf.put_slice(&self.to_ne_bytes());
            }
        }

        impl WritableElement for $ty {}
    };
}

macro_rules! impl_element_complex {
    ($ty:ty, $dtype:ident) => {
        impl Element for Complex<$ty> {
            const TYPE: DataType = DataType::$dtype;

            #[inline]
            fn from_ne_bytes(bytes: &[u8]) -> Option<Self> {
                const W: usize = std::mem::size_of::<$ty>();
                if bytes.len() != 2 * W {
                    return None;
                }
                let (re, im) = bytes.split_at(W);
                Some(Complex::new(
                    <$ty>::from_ne_bytes(re.try_into().ok()?),
                    <$ty>::from_ne_bytes(im.try_into().ok()?),
                ))
            }

            #[inline]
            fn put_ne_bytes<B: BufMut>(self, buf: &mut B) {
                buf.put_slice(&self.re.to_ne_bytes());
                buf.put_slice(&self.im.to_ne_bytes());
            }
        }

        impl WritableElement for Complex<$ty> {}
    };
}

impl Element for bool {
    const TYPE: DataType = DataType::Bool;

    fn from_ne_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0] => Some(false),
            [1] => Some(true),
            _ => None,
        }
    }

    fn put_ne_bytes<B: BufMut>(self, buf: &mut B) {
        buf.put_u8(self as u8);
    }
}

impl_element_numeric!(i8, I8);
impl_element_numeric!(i16, I16);
impl_element_numeric!(i32, I32);
impl_element_numeric!(i64, I64);
impl_element_numeric!(u8, U8);
impl_element_numeric!(u16, U16);
impl_element_numeric!(u32, U32);
impl_element_numeric!(u64, U64);
impl_element_numeric!(f32, F32);
impl_element_numeric!(f64, F64);
impl_element_complex!(f32, C64);
impl_element_complex!(f64, C128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_rust_sizes() {
        assert_eq!(i16::TYPE.byte_width(), std::mem::size_of::<i16>());
        assert_eq!(u64::TYPE.byte_width(), std::mem::size_of::<u64>());
        assert_eq!(f32::TYPE.byte_width(), std::mem::size_of::<f32>());
        assert_eq!(
            Complex::<f64>::TYPE.byte_width(),
            std::mem::size_of::<Complex<f64>>()
        );
    }

    #[test]
    fn numeric_encode_decode() {
        let mut buf = Vec::new();
        (-12345i32).put_ne_bytes(&mut buf);
        assert_eq!(buf, (-12345i32).to_ne_bytes());
        assert_eq!(<i32 as Element>::from_ne_bytes(&buf), Some(-12345));
        assert_eq!(<i32 as Element>::from_ne_bytes(&buf[..3]), None);
    }

    #[test]
    fn complex_stores_re_then_im() {
        let mut buf = Vec::new();
        Complex::new(1.5f32, -2.0f32).put_ne_bytes(&mut buf);
        assert_eq!(&buf[..4], &1.5f32.to_ne_bytes());
        assert_eq!(&buf[4..], &(-2.0f32).to_ne_bytes());
        assert_eq!(
            <Complex<f32> as Element>::from_ne_bytes(&buf),
            Some(Complex::new(1.5, -2.0))
        );
    }

    #[test]
    fn bool_rejects_non_0_1() {
        assert_eq!(<bool as Element>::from_ne_bytes(&[0]), Some(false));
        assert_eq!(<bool as Element>::from_ne_bytes(&[1]), Some(true));
        assert_eq!(<bool as Element>::from_ne_bytes(&[2]), None);
    }
}
