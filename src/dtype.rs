/// Logical element type of an array.
///
/// Every variant maps onto one `descr` kind character and one byte width in
/// the `.npy` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    C64,
    C128,
}

/// The `descr` type-kind character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TypeKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Complex,
}

impl TypeKind {
    pub const fn as_char(self) -> char {
        match self {
            TypeKind::Bool => 'b',
            TypeKind::Signed => 'i',
            TypeKind::Unsigned => 'u',
            TypeKind::Float => 'f',
            TypeKind::Complex => 'c',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'b' => Some(TypeKind::Bool),
            'i' => Some(TypeKind::Signed),
            'u' => Some(TypeKind::Unsigned),
            'f' => Some(TypeKind::Float),
            'c' => Some(TypeKind::Complex),
            _ => None,
        }
    }
}

impl DataType {
    pub const fn kind(&self) -> TypeKind {
        match self {
            DataType::Bool => TypeKind::Bool,
            DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64 => TypeKind::Signed,
            DataType::U8 | DataType::U16 | DataType::U32 | DataType::U64 => TypeKind::Unsigned,
            DataType::F32 | DataType::F64 => TypeKind::Float,
            DataType::C64 | DataType::C128 => TypeKind::Complex,
        }
    }

    /// Size in bytes of one element, as recorded in `descr`.
    ///
    /// Complex types record the size of the whole (re, im) pair.
    pub const fn byte_width(&self) -> usize {
        match self {
            DataType::Bool | DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 | DataType::C64 => 8,
            DataType::C128 => 16,
        }
    }

    /// Width of the byte-order window: one real component for complex types.
    pub const fn component_width(&self) -> usize {
        match self {
            DataType::C64 => 4,
            DataType::C128 => 8,
            other => other.byte_width(),
        }
    }

    /// Look up the data type for a kind/width pair read from a header.
    pub const fn from_kind_and_width(kind: TypeKind, width: usize) -> Option<Self> {
        match (kind, width) {
            (TypeKind::Bool, 1) => Some(DataType::Bool),
            (TypeKind::Signed, 1) => Some(DataType::I8),
            (TypeKind::Signed, 2) => Some(DataType::I16),
            (TypeKind::Signed, 4) => Some(DataType::I32),
            (TypeKind::Signed, 8) => Some(DataType::I64),
            (TypeKind::Unsigned, 1) => Some(DataType::U8),
            (TypeKind::Unsigned, 2) => Some(DataType::U16),
            (TypeKind::Unsigned, 4) => Some(DataType::U32),
            (TypeKind::Unsigned, 8) => Some(DataType::U64),
            (TypeKind::Float, 4) => Some(DataType::F32),
            (TypeKind::Float, 8) => Some(DataType::F64),
            (TypeKind::Complex, 8) => Some(DataType::C64),
            (TypeKind::Complex, 16) => Some(DataType::C128),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_chars_roundtrip() {
        for kind in [
            TypeKind::Bool,
            TypeKind::Signed,
            TypeKind::Unsigned,
            TypeKind::Float,
            TypeKind::Complex,
        ] {
            assert_eq!(TypeKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(TypeKind::from_char('O'), None);
    }

    #[test]
    fn complex_width_is_the_pair() {
        assert_eq!(DataType::C64.byte_width(), 8);
        assert_eq!(DataType::C64.component_width(), 4);
        assert_eq!(DataType::C128.byte_width(), 16);
        assert_eq!(DataType::C128.component_width(), 8);
        assert_eq!(
            DataType::from_kind_and_width(TypeKind::Complex, 16),
            Some(DataType::C128)
        );
    }

    #[test]
    fn unknown_width_has_no_type() {
        assert_eq!(DataType::from_kind_and_width(TypeKind::Float, 2), None);
        assert_eq!(DataType::from_kind_and_width(TypeKind::Bool, 4), None);
    }
}
