/// Magic string that opens every `.npy` file.
pub const MAGIC_NUMBER: &[u8; 6] = b"\x93NUMPY";

/// Total preamble plus header length is padded to a multiple of this.
pub const HEADER_ALIGNMENT: usize = 64;

/// Layout of the fixed preamble:
///
/// ```text
/// magic (6) | major (1) | minor (1) | header_len (2 for v1.0, 4 for v2.0)
/// ```
///
pub const VERSION_BYTES_LEN: usize = 2;
pub const V1_HEADER_LEN_FIELD: usize = 2;
pub const V2_HEADER_LEN_FIELD: usize = 4;

/// Largest header length representable in a version 1.0 length field.
pub const V1_MAX_HEADER_LEN: usize = u16::MAX as usize;

/// Probe written in native order to detect the host byte order: the first
/// byte in memory is `'<'` on little-endian hosts and `'>'` on big-endian.
pub const ENDIAN_PROBE: u16 = 0x3E3C;
