use crate::element::TypeCode;

/// 32-bit complex number, stored as two `f32` lanes (real, imaginary).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Complex32 {
    /// Real part.
    pub re: f32,
    /// Imaginary part.
    pub im: f32,
}

/// 64-bit complex number, stored as two `f64` lanes (real, imaginary).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Complex64 {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

mod sealed {
    pub trait Sealed {}
}

/// A Rust type that corresponds 1:1 to one of the 13 built-in
/// [`TypeCode`]s.
///
/// Sealed: the built-in set is closed, so only the types below may
/// implement it. User-defined element types are handled through the
/// opaque-byte API instead (`Matrix::set_element_opaque` /
/// `extract_element_opaque` in `grb-core`).
pub trait GrbScalar: sealed::Sealed + Copy + Send + Sync + 'static {
    /// The built-in code this Rust type is stored as.
    const TYPE_CODE: TypeCode;
}

macro_rules! impl_grb_scalar {
    ($ty:ty, $code:expr) => {
        impl sealed::Sealed for $ty {}
        impl GrbScalar for $ty {
            const TYPE_CODE: TypeCode = $code;
        }
    };
}

impl_grb_scalar!(bool, TypeCode::Bool);
impl_grb_scalar!(i8, TypeCode::Int8);
impl_grb_scalar!(i16, TypeCode::Int16);
impl_grb_scalar!(i32, TypeCode::Int32);
impl_grb_scalar!(i64, TypeCode::Int64);
impl_grb_scalar!(u8, TypeCode::Uint8);
impl_grb_scalar!(u16, TypeCode::Uint16);
impl_grb_scalar!(u32, TypeCode::Uint32);
impl_grb_scalar!(u64, TypeCode::Uint64);
impl_grb_scalar!(f32, TypeCode::Fp32);
impl_grb_scalar!(f64, TypeCode::Fp64);
impl_grb_scalar!(Complex32, TypeCode::Fc32);
impl_grb_scalar!(Complex64, TypeCode::Fc64);
