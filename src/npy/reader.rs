use std::io::{self, Read};

use crate::{
    array::{ArrayD, ArrayError, Element, util::num_elements},
    consts,
    npy::{
        error::{FormatError, NpyError},
        header::{Header, Version},
    },
};

/// Read and validate the preamble and header dictionary.
///
/// On success the reader is positioned at the first payload byte.
pub fn read_header<R: Read>(reader: &mut R) -> Result<(Version, Header), NpyError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic).map_err(truncated_as_bad_magic)?;
    if &magic != consts::MAGIC_NUMBER {
        return Err(FormatError::BadMagic.into());
    }

    let mut version_bytes = [0u8; consts::VERSION_BYTES_LEN];
    reader.read_exact(&mut version_bytes)?;
    let version = Version::try_from((version_bytes[0], version_bytes[1]))?;

    let header_len = match version {
        Version::V1_0 => {
            let mut len = [0u8; consts::V1_HEADER_LEN_FIELD];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        Version::V2_0 => {
            let mut len = [0u8; consts::V2_HEADER_LEN_FIELD];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
    };
    let preamble = version.preamble_len();
    if (preamble + header_len) % consts::HEADER_ALIGNMENT != 0 {
        return Err(FormatError::Misaligned {
            preamble,
            header_len,
        }
        .into());
    }

    let text = read_exact_vec(reader, header_len)?;
    if !text.is_ascii() {
        return Err(FormatError::NonAsciiHeader.into());
    }
    let text = String::from_utf8(text).map_err(|_| FormatError::NonAsciiHeader)?;
    let header = Header::parse(&text)?;

    tracing::debug!(
        %version,
        descr = %header.descr,
        fortran_order = header.fortran_order,
        shape = ?header.shape.as_slice(),
        "read npy header"
    );
    Ok((version, header))
}

/// Read a whole `.npy` stream into a dynamic-rank array of `T`.
///
/// The stored `descr` must have the kind and width of `T`; foreign byte order is converted to the
/// host order. A `fortran_order` file keeps its payload order and is returned with the stored
/// shape reversed, which is the transpose of the array it describes.
pub fn read_npy<T: Element, R: Read>(reader: &mut R) -> Result<ArrayD<T>, NpyError> {
    let (_, mut header) = read_header(reader)?;

    if !header.descr.matches::<T>() {
        return Err(NpyError::TypeMismatch {
            descr: header.descr.to_string(),
            expected: format!("{}{}", T::TYPE.kind().as_char(), T::TYPE.byte_width()),
        });
    }

    if header.fortran_order {
        tracing::warn!(
            shape = ?header.shape.as_slice(),
            "fortran-ordered file loaded with reversed shape; data is the transpose"
        );
        header.shape.reverse();
    }

    let count = num_elements(&header.shape)?;
    let width = T::TYPE.byte_width();
    let payload_len = count
        .checked_mul(width)
        .ok_or(ArrayError::ShapeOverflow)?;
    let mut payload = read_exact_vec(reader, payload_len)?;

    let window = T::TYPE.component_width();
    if header.descr.byte_order.needs_swap(window) {
        tracing::trace!(window, bytes = payload_len, "swapping payload byte order");
        payload
            .chunks_exact_mut(window)
            .for_each(|chunk| chunk.reverse());
    }

    let data = payload
        .chunks_exact(width)
        .map(T::from_ne_bytes)
        .collect::<Option<Vec<T>>>()
        .ok_or(FormatError::InvalidBoolByte)?;

    Ok(ArrayD::from_shape_vec(header.shape, data)?)
}

/// Read exactly `len` bytes without trusting `len` for the up-front allocation.
fn read_exact_vec<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes, stream ended after {}", buf.len()),
        ));
    }
    Ok(buf)
}

/// A stream too short to hold the magic string is not a `.npy` file.
fn truncated_as_bad_magic(e: io::Error) -> NpyError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        FormatError::BadMagic.into()
    } else {
        e.into()
    }
}
