//! `.npy` header model.
//!
//! ```text
//! offset  size   field
//! 0       6      magic "\x93NUMPY"
//! 6       1      major version (1 or 2)
//! 7       1      minor version (0)
//! 8       2|4    header length, little-endian (2 bytes for 1.0, 4 bytes for 2.0)
//! 8+L     H      header dictionary, ASCII, space padded, newline terminated
//! 8+L+H   ...    payload, element_count * element_size bytes
//! ```
//!
//! `8 + L + H` is always a multiple of 64.
use std::{fmt, str::FromStr};

use bytes::{BufMut, BytesMut};

use crate::{
    array::{Dimension, Element, IxDyn, StridedArray},
    consts,
    dtype::{DataType, TypeKind},
    npy::{
        error::{FormatError, NpyError},
        parser::{HeaderParseError, parse_header},
    },
};

/// Byte order character of a `descr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ByteOrder {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `|`, used for single-byte types.
    NotApplicable,
    /// `=`
    Native,
}

impl ByteOrder {
    /// The host byte order, found by probing the in-memory layout of a known `u16`.
    pub fn host() -> Self {
        if consts::ENDIAN_PROBE.to_ne_bytes()[0] == b'<' {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::NotApplicable => '|',
            ByteOrder::Native => '=',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(ByteOrder::Little),
            '>' => Some(ByteOrder::Big),
            '|' => Some(ByteOrder::NotApplicable),
            '=' => Some(ByteOrder::Native),
            _ => None,
        }
    }

    /// Whether data in this byte order must be swapped on the host, for a swap window of
    /// `width` bytes.
    pub fn needs_swap(self, width: usize) -> bool {
        width > 1
            && match self {
                ByteOrder::Little | ByteOrder::Big => self != Self::host(),
                ByteOrder::NotApplicable | ByteOrder::Native => false,
            }
    }
}

/// Element type descriptor: byte order, type kind and byte width, e.g. `<i4`.
///
/// The kind character is kept as written, so descriptors of kinds this crate has no element
/// type for (`<U2`, `|S4`, `<M8`) still parse and are rejected as a type mismatch on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Descr {
    pub byte_order: ByteOrder,
    pub kind_char: char,
    pub width: usize,
}

impl Descr {
    /// The descriptor the writer records for `dtype`: host byte order, kind and width.
    pub fn native(dtype: DataType) -> Self {
        Self {
            byte_order: ByteOrder::host(),
            kind_char: dtype.kind().as_char(),
            width: dtype.byte_width(),
        }
    }

    /// The type kind, `None` for kinds without an element type (strings, datetimes, ...).
    pub fn kind(&self) -> Option<TypeKind> {
        TypeKind::from_char(self.kind_char)
    }

    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_kind_and_width(self.kind()?, self.width)
    }

    /// Whether this descriptor describes elements of type `T`.
    pub fn matches<T: Element>(&self) -> bool {
        self.kind() == Some(T::TYPE.kind()) && self.width == T::TYPE.byte_width()
    }
}

impl fmt::Display for Descr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.byte_order.as_char(),
            self.kind_char,
            self.width
        )
    }
}

impl FromStr for Descr {
    type Err = HeaderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HeaderParseError::InvalidDescr(s.to_owned());
        let mut chars = s.chars();
        let byte_order = chars.next().and_then(ByteOrder::from_char).ok_or_else(invalid)?;
        let kind_char = chars
            .next()
            .filter(char::is_ascii_alphabetic)
            .ok_or_else(invalid)?;
        let width_str = chars.as_str();
        if width_str.is_empty() || !width_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let width = width_str.parse::<usize>().map_err(|_| invalid())?;
        Ok(Self {
            byte_order,
            kind_char,
            width,
        })
    }
}

/// On-disk format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Version {
    /// 1.0: 16-bit header length field.
    V1_0,
    /// 2.0: 32-bit header length field.
    V2_0,
}

impl Version {
    pub const fn major(self) -> u8 {
        match self {
            Version::V1_0 => 1,
            Version::V2_0 => 2,
        }
    }

    pub const fn minor(self) -> u8 {
        0
    }

    /// Size of the header length field.
    pub const fn len_field_size(self) -> usize {
        match self {
            Version::V1_0 => consts::V1_HEADER_LEN_FIELD,
            Version::V2_0 => consts::V2_HEADER_LEN_FIELD,
        }
    }

    /// Bytes before the header text: magic, version bytes and length field.
    pub const fn preamble_len(self) -> usize {
        consts::MAGIC_NUMBER.len() + consts::VERSION_BYTES_LEN + self.len_field_size()
    }

    /// Pick 1.0 unless the padded header would overflow its 16-bit length field.
    pub fn auto_for(text_len: usize) -> Self {
        if padded_header_len(Version::V1_0, text_len) <= consts::V1_MAX_HEADER_LEN {
            Version::V1_0
        } else {
            Version::V2_0
        }
    }
}

impl TryFrom<(u8, u8)> for Version {
    type Error = FormatError;

    fn try_from((major, minor): (u8, u8)) -> Result<Self, Self::Error> {
        match (major, minor) {
            (1, 0) => Ok(Version::V1_0),
            (2, 0) => Ok(Version::V2_0),
            _ => Err(FormatError::UnsupportedVersion { major, minor }),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// Number of padding spaces after a header text of `text_len` bytes, not counting the
/// terminating newline.
pub const fn padding_len(version: Version, text_len: usize) -> usize {
    let align = consts::HEADER_ALIGNMENT;
    align - 1 - (version.preamble_len() + text_len) % align
}

/// Header length field value for a header text of `text_len` bytes: text, padding, newline.
pub const fn padded_header_len(version: Version, text_len: usize) -> usize {
    text_len + padding_len(version, text_len) + 1
}

/// Decoded header dictionary.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Header {
    pub descr: Descr,
    pub fortran_order: bool,
    pub shape: IxDyn,
}

impl Header {
    /// The header the writer records for `array`.
    pub fn for_array<T: Element, D: Dimension>(array: &StridedArray<T, D>) -> Self {
        Self {
            descr: Descr::native(T::TYPE),
            fortran_order: false,
            shape: IxDyn::from_slice(array.shape()),
        }
    }

    /// Parse header dictionary text.
    pub fn parse(text: &str) -> Result<Self, HeaderParseError> {
        parse_header(text)
    }

    /// The unpadded dictionary text, keys in alphabetical order.
    ///
    /// A one-element shape keeps its trailing comma (`(7,)`), an empty shape renders as `()`.
    pub fn to_text(&self) -> String {
        let dims = match self.shape.as_slice() {
            [] => String::new(),
            [d] => format!("{d},"),
            dims => dims
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        };
        format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': ({}), }}",
            self.descr,
            if self.fortran_order { "True" } else { "False" },
            dims
        )
    }

    /// Encode magic, version, length field and padded header text.
    ///
    /// `version = None` selects 1.0 when the padded header fits its 16-bit length field and 2.0
    /// otherwise. Returns the version actually used.
    ///
    /// # Errors
    /// Returns [`NpyError::Capacity`] if the header is too long for the requested version.
    pub fn to_bytes(&self, version: Option<Version>) -> Result<(Version, BytesMut), NpyError> {
        let text = self.to_text();
        let version = version.unwrap_or_else(|| Version::auto_for(text.len()));
        let header_len = padded_header_len(version, text.len());

        let mut buf = BytesMut::with_capacity(version.preamble_len() + header_len);
        buf.put_slice(consts::MAGIC_NUMBER);
        buf.put_u8(version.major());
        buf.put_u8(version.minor());
        match version {
            Version::V1_0 => {
                let len = u16::try_from(header_len)
                    .map_err(|_| NpyError::Capacity { len: header_len })?;
                buf.put_u16_le(len);
            }
            Version::V2_0 => {
                let len = u32::try_from(header_len)
                    .map_err(|_| NpyError::Capacity { len: header_len })?;
                buf.put_u32_le(len);
            }
        }
        buf.put_slice(text.as_bytes());
        buf.put_bytes(b' ', padding_len(version, text.len()));
        buf.put_u8(b'\n');

        debug_assert_eq!(buf.len() % consts::HEADER_ALIGNMENT, 0);
        Ok((version, buf))
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    fn header(descr: &str, shape: IxDyn) -> Header {
        Header {
            descr: descr.parse().unwrap(),
            fortran_order: false,
            shape,
        }
    }

    #[test]
    fn host_order_matches_target() {
        if cfg!(target_endian = "little") {
            assert_eq!(ByteOrder::host(), ByteOrder::Little);
        } else {
            assert_eq!(ByteOrder::host(), ByteOrder::Big);
        }
        assert!(!ByteOrder::host().needs_swap(8));
    }

    #[test]
    fn single_byte_and_unordered_never_swap() {
        assert!(!ByteOrder::Little.needs_swap(1));
        assert!(!ByteOrder::Big.needs_swap(1));
        assert!(!ByteOrder::NotApplicable.needs_swap(4));
        assert!(!ByteOrder::Native.needs_swap(4));
    }

    #[test]
    fn descr_display_and_parse() {
        let d: Descr = "<c16".parse().unwrap();
        assert_eq!(d.kind(), Some(TypeKind::Complex));
        assert_eq!(d.width, 16);
        assert_eq!(d.to_string(), "<c16");
        assert_eq!(d.data_type(), Some(DataType::C128));

        for bad in ["", "<", "<i", "<44", "!i4", "<i4x", "<i-4"] {
            assert!(bad.parse::<Descr>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn unknown_kinds_parse_without_a_type() {
        for text in ["<U2", "|S4", "<M8", "|V4"] {
            let d: Descr = text.parse().unwrap();
            assert_eq!(d.to_string(), text);
            assert_eq!(d.kind(), None);
            assert_eq!(d.data_type(), None);
            assert!(!d.matches::<i32>());
        }
    }

    #[test]
    fn native_descr_uses_host_order() {
        let d = Descr::native(DataType::U16);
        assert_eq!(d.byte_order, ByteOrder::host());
        assert_eq!(&d.to_string()[1..], "u2");
        assert!(d.matches::<u16>());
        assert!(!d.matches::<i16>());
        assert!(!d.matches::<u32>());
    }

    #[test]
    fn text_follows_shape_rank() {
        assert_eq!(
            header("<i4", smallvec![]).to_text(),
            "{'descr': '<i4', 'fortran_order': False, 'shape': (), }"
        );
        assert_eq!(
            header("<i4", smallvec![10]).to_text(),
            "{'descr': '<i4', 'fortran_order': False, 'shape': (10,), }"
        );
        assert_eq!(
            header("<i4", smallvec![10, 11, 12]).to_text(),
            "{'descr': '<i4', 'fortran_order': False, 'shape': (10, 11, 12), }"
        );
    }

    #[test]
    fn text_parses_back() {
        let h = header(">f8", smallvec![3, 1, 4]);
        assert_eq!(Header::parse(&h.to_text()).unwrap(), h);
    }

    #[test]
    fn sixty_one_byte_header_pads_to_128() {
        let h = header("<i4", smallvec![10, 11]);
        let text = h.to_text();
        assert_eq!(text.len(), 61);

        let (version, bytes) = h.to_bytes(None).unwrap();
        assert_eq!(version, Version::V1_0);
        assert_eq!(bytes.len(), 128);
        assert_eq!(&bytes[..6], consts::MAGIC_NUMBER);
        assert_eq!(&bytes[6..8], &[1, 0]);
        assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 118);

        let padding = &bytes[10 + 61..];
        assert_eq!(padding.len(), 57);
        assert!(padding[..56].iter().all(|&b| b == b' '));
        assert_eq!(padding[56], b'\n');
    }

    #[test]
    fn padding_always_aligns() {
        for version in [Version::V1_0, Version::V2_0] {
            for text_len in 0..200 {
                let total = version.preamble_len() + padded_header_len(version, text_len);
                assert_eq!(total % 64, 0);
                assert!(padding_len(version, text_len) < 64);
            }
        }
    }

    #[test]
    fn version_two_uses_wide_length_field() {
        let h = header("<f4", smallvec![2, 2]);
        let (version, bytes) = h.to_bytes(Some(Version::V2_0)).unwrap();
        assert_eq!(version, Version::V2_0);
        assert_eq!(&bytes[6..8], &[2, 0]);
        let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert_eq!(12 + len, bytes.len());
        assert_eq!(bytes.len() % 64, 0);
    }

    #[test]
    fn oversized_header_switches_to_version_two() {
        let h = header("<i8", IxDyn::from_elem(1, 22_000));
        assert!(h.to_text().len() >= 65_536);
        assert_eq!(Version::auto_for(h.to_text().len()), Version::V2_0);

        let (version, bytes) = h.to_bytes(None).unwrap();
        assert_eq!(version, Version::V2_0);
        assert_eq!(bytes.len() % 64, 0);

        match h.to_bytes(Some(Version::V1_0)) {
            Err(NpyError::Capacity { len }) => assert!(len > u16::MAX as usize),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unsupported_versions_are_rejected() {
        assert_eq!(Version::try_from((1, 0)).unwrap(), Version::V1_0);
        assert_eq!(Version::try_from((2, 0)).unwrap(), Version::V2_0);
        assert!(matches!(
            Version::try_from((3, 0)),
            Err(FormatError::UnsupportedVersion { major: 3, minor: 0 })
        ));
        assert!(Version::try_from((1, 1)).is_err());
    }
}
