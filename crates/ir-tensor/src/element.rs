use std::fmt::Debug;

use crate::dtype::DType;
use crate::storage::CpuStorage;

/// A Rust scalar type that maps onto exactly one storage variant.
pub trait Element: Copy + Default + Debug + Send + Sync + 'static {
    const DTYPE: DType;

    /// Borrow the storage as `&[Self]` if its dtype is exactly `Self::DTYPE`.
    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    /// Wrap an owned vector in the matching storage variant.
    fn into_storage(data: Vec<Self>) -> CpuStorage;
}

/// A scalar type that a matmul kernel body is written against.
///
/// Each compute class has one representative; storage of any dtype in the
/// same class can be viewed as the representative type. The unsigned integer
/// partners are viewed with `bytemuck::cast_slice`, which is checked at
/// compile time for same-size plain-old-data types.
pub trait ComputeElement: Element {
    /// `acc + a * b`, wrapping for integers.
    fn mul_add(acc: Self, a: Self, b: Self) -> Self;

    fn class_view(storage: &CpuStorage) -> Option<&[Self]>;

    fn class_view_mut(storage: &mut CpuStorage) -> Option<&mut [Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            fn slice(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> CpuStorage {
                CpuStorage::$variant(data)
            }
        }
    };
}

impl_element!(i32, I32);
impl_element!(u32, U32);
impl_element!(i64, I64);
impl_element!(u64, U64);
impl_element!(f32, F32);
impl_element!(f64, F64);

macro_rules! impl_int_compute {
    ($ty:ty, $signed:ident, $unsigned:ident) => {
        impl ComputeElement for $ty {
            fn mul_add(acc: Self, a: Self, b: Self) -> Self {
                acc.wrapping_add(a.wrapping_mul(b))
            }

            fn class_view(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$signed(v) => Some(v.as_slice()),
                    CpuStorage::$unsigned(v) => Some(bytemuck::cast_slice(v.as_slice())),
                    _ => None,
                }
            }

            fn class_view_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
                match storage {
                    CpuStorage::$signed(v) => Some(v.as_mut_slice()),
                    CpuStorage::$unsigned(v) => {
                        Some(bytemuck::cast_slice_mut(v.as_mut_slice()))
                    }
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_float_compute {
    ($ty:ty, $variant:ident) => {
        impl ComputeElement for $ty {
            fn mul_add(acc: Self, a: Self, b: Self) -> Self {
                acc + a * b
            }

            fn class_view(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn class_view_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_int_compute!(i32, I32, U32);
impl_int_compute!(i64, I64, U64);
impl_float_compute!(f32, F32);
impl_float_compute!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_exact_dtype_only() {
        let s = CpuStorage::U32(vec![1, 2]);
        assert_eq!(u32::slice(&s), Some(&[1u32, 2][..]));
        assert!(i32::slice(&s).is_none());
    }

    #[test]
    fn test_class_view_unsigned_partner() {
        let s = CpuStorage::U32(vec![7, u32::MAX]);
        let view = i32::class_view(&s).unwrap();
        assert_eq!(view, &[7, -1]);
        assert!(i64::class_view(&s).is_none());
        assert!(f32::class_view(&s).is_none());
    }

    #[test]
    fn test_class_view_mut_writes_through() {
        let mut s = CpuStorage::U64(vec![0, 0]);
        i64::class_view_mut(&mut s).unwrap()[1] = -1;
        assert_eq!(s, CpuStorage::U64(vec![0, u64::MAX]));
    }

    #[test]
    fn test_wrapping_mul_add_matches_unsigned() {
        let a: u32 = 3_000_000_000;
        let b: u32 = 3;
        let expected = a.wrapping_mul(b).wrapping_add(5);
        let got = i32::mul_add(5, a as i32, b as i32);
        assert_eq!(got as u32, expected);
    }

    #[test]
    fn test_into_storage() {
        assert_eq!(f64::into_storage(vec![1.5]).dtype(), DType::F64);
        assert_eq!(<u64 as Element>::DTYPE, DType::U64);
    }
}
