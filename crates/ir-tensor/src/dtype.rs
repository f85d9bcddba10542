use std::fmt;

/// Supported element types for tensor storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit signed integer.
    I64,
    /// 64-bit unsigned integer.
    U64,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

/// The arithmetic path a dtype is computed on.
///
/// Signed and unsigned integers of the same width share a class: with
/// wrapping two's-complement accumulation their products are bit-identical,
/// provided the caller keeps values representable in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeClass {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    /// All dtypes, in declaration order.
    pub const ALL: [DType; 6] = [
        DType::I32,
        DType::U32,
        DType::I64,
        DType::U64,
        DType::F32,
        DType::F64,
    ];

    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 => 8,
        }
    }

    /// The equivalence table: which compute path this dtype runs on.
    pub fn compute_class(&self) -> ComputeClass {
        match self {
            DType::I32 | DType::U32 => ComputeClass::Int32,
            DType::I64 | DType::U64 => ComputeClass::Int64,
            DType::F32 => ComputeClass::Float32,
            DType::F64 => ComputeClass::Float64,
        }
    }

    /// Returns true if `self` and `other` can be computed by the same kernel body.
    pub fn shares_compute_path(&self, other: DType) -> bool {
        self.compute_class() == other.compute_class()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::I32 => write!(f, "i32"),
            DType::U32 => write!(f, "u32"),
            DType::I64 => write!(f, "i64"),
            DType::U64 => write!(f, "u64"),
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::U64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_signed_unsigned_share_path() {
        assert!(DType::I32.shares_compute_path(DType::U32));
        assert!(DType::U64.shares_compute_path(DType::I64));
        assert!(!DType::I32.shares_compute_path(DType::I64));
        assert!(!DType::F32.shares_compute_path(DType::I32));
        assert!(!DType::F32.shares_compute_path(DType::F64));
    }

    #[test]
    fn test_classes_are_width_preserving() {
        for dtype in DType::ALL {
            for other in DType::ALL {
                if dtype.shares_compute_path(other) {
                    assert_eq!(dtype.size_in_bytes(), other.size_in_bytes());
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::U32.to_string(), "u32");
        assert_eq!(DType::F64.to_string(), "f64");
    }
}
