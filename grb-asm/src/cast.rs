use grb_types::{Complex32, Complex64, TypeCode};

/// A decoded built-in scalar: the cast factory's pivot representation.
///
/// Casting `(from, to)` goes `bytes -> Scalar::decode(from) ->
/// Scalar::cast_to(to) -> Scalar::encode(to)` instead of a 13x13 table of
/// hand-written conversion functions; the match arms below are the
/// entire cast factory, keyed structurally by `TypeCode` rather than by
/// a `(to_code, from_code)` function-pointer pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Boolean lane.
    Bool(bool),
    /// Signed 8-bit lane.
    Int8(i8),
    /// Signed 16-bit lane.
    Int16(i16),
    /// Signed 32-bit lane.
    Int32(i32),
    /// Signed 64-bit lane.
    Int64(i64),
    /// Unsigned 8-bit lane.
    Uint8(u8),
    /// Unsigned 16-bit lane.
    Uint16(u16),
    /// Unsigned 32-bit lane.
    Uint32(u32),
    /// Unsigned 64-bit lane.
    Uint64(u64),
    /// 32-bit float lane.
    Fp32(f32),
    /// 64-bit float lane.
    Fp64(f64),
    /// 32-bit complex lane.
    Fc32(Complex32),
    /// 64-bit complex lane.
    Fc64(Complex64),
}

impl Scalar {
    /// Decode a byte buffer of the declared type's native size into a
    /// pivot value. `bytes` must be exactly `code.size()` long.
    pub fn decode(code: TypeCode, bytes: &[u8]) -> Scalar {
        match code {
            TypeCode::Bool => Scalar::Bool(bytes[0] != 0),
            TypeCode::Int8 => Scalar::Int8(i8::from_ne_bytes([bytes[0]])),
            TypeCode::Int16 => Scalar::Int16(i16::from_ne_bytes(bytes[..2].try_into().unwrap())),
            TypeCode::Int32 => Scalar::Int32(i32::from_ne_bytes(bytes[..4].try_into().unwrap())),
            TypeCode::Int64 => Scalar::Int64(i64::from_ne_bytes(bytes[..8].try_into().unwrap())),
            TypeCode::Uint8 => Scalar::Uint8(bytes[0]),
            TypeCode::Uint16 => Scalar::Uint16(u16::from_ne_bytes(bytes[..2].try_into().unwrap())),
            TypeCode::Uint32 => Scalar::Uint32(u32::from_ne_bytes(bytes[..4].try_into().unwrap())),
            TypeCode::Uint64 => Scalar::Uint64(u64::from_ne_bytes(bytes[..8].try_into().unwrap())),
            TypeCode::Fp32 => Scalar::Fp32(f32::from_ne_bytes(bytes[..4].try_into().unwrap())),
            TypeCode::Fp64 => Scalar::Fp64(f64::from_ne_bytes(bytes[..8].try_into().unwrap())),
            TypeCode::Fc32 => Scalar::Fc32(Complex32 {
                re: f32::from_ne_bytes(bytes[0..4].try_into().unwrap()),
                im: f32::from_ne_bytes(bytes[4..8].try_into().unwrap()),
            }),
            TypeCode::Fc64 => Scalar::Fc64(Complex64 {
                re: f64::from_ne_bytes(bytes[0..8].try_into().unwrap()),
                im: f64::from_ne_bytes(bytes[8..16].try_into().unwrap()),
            }),
        }
    }

    /// Encode into `out`, which must be exactly `self`'s native size long.
    pub fn encode(self, out: &mut [u8]) {
        match self {
            Scalar::Bool(v) => out[0] = v as u8,
            Scalar::Int8(v) => out[0] = v.to_ne_bytes()[0],
            Scalar::Int16(v) => out[..2].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Int32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Int64(v) => out[..8].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Uint8(v) => out[0] = v,
            Scalar::Uint16(v) => out[..2].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Uint32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Uint64(v) => out[..8].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Fp32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Fp64(v) => out[..8].copy_from_slice(&v.to_ne_bytes()),
            Scalar::Fc32(v) => {
                out[0..4].copy_from_slice(&v.re.to_ne_bytes());
                out[4..8].copy_from_slice(&v.im.to_ne_bytes());
            }
            Scalar::Fc64(v) => {
                out[0..8].copy_from_slice(&v.re.to_ne_bytes());
                out[8..16].copy_from_slice(&v.im.to_ne_bytes());
            }
        }
    }

    /// `self` as an `f64`, for lossy conversions into/out of the real
    /// types. Complex values contribute only their real part. Exposed
    /// crate-wide (not just to `cast_to`) since `eval`'s arithmetic dispatch
    /// needs the same pivot for float-typed binary/unary ops.
    pub(crate) fn as_f64_lossy(self) -> f64 {
        self.as_f64()
    }

    fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(v) => v as u8 as f64,
            Scalar::Int8(v) => v as f64,
            Scalar::Int16(v) => v as f64,
            Scalar::Int32(v) => v as f64,
            Scalar::Int64(v) => v as f64,
            Scalar::Uint8(v) => v as f64,
            Scalar::Uint16(v) => v as f64,
            Scalar::Uint32(v) => v as f64,
            Scalar::Uint64(v) => v as f64,
            Scalar::Fp32(v) => v as f64,
            Scalar::Fp64(v) => v,
            Scalar::Fc32(v) => v.re as f64,
            Scalar::Fc64(v) => v.re,
        }
    }

    /// Convert to the target built-in type, following truncating
    /// (non-saturating) integer/float conversion rules.
    ///
    /// Integer targets go through the `i128` pivot ([`Scalar::as_i128_lossy`])
    /// rather than `f64`: an `f64` pivot loses bits for any `i64`/`u64`
    /// magnitude past 2^53, which would silently corrupt ordinary large
    /// indices and counts. Float targets still go through `f64`, matching
    /// the precision loss real hardware float conversion has anyway.
    pub fn cast_to(self, to: TypeCode) -> Scalar {
        match to {
            TypeCode::Bool => Scalar::Bool(self.as_f64() != 0.0),
            TypeCode::Int8 => Scalar::Int8(self.as_i128_lossy() as i8),
            TypeCode::Int16 => Scalar::Int16(self.as_i128_lossy() as i16),
            TypeCode::Int32 => Scalar::Int32(self.as_i128_lossy() as i32),
            TypeCode::Int64 => Scalar::Int64(self.as_i128_lossy() as i64),
            TypeCode::Uint8 => Scalar::Uint8(self.as_i128_lossy() as u8),
            TypeCode::Uint16 => Scalar::Uint16(self.as_i128_lossy() as u16),
            TypeCode::Uint32 => Scalar::Uint32(self.as_i128_lossy() as u32),
            TypeCode::Uint64 => Scalar::Uint64(self.as_i128_lossy() as u64),
            TypeCode::Fp32 => Scalar::Fp32(self.as_f64() as f32),
            TypeCode::Fp64 => Scalar::Fp64(self.as_f64()),
            TypeCode::Fc32 => Scalar::Fc32(Complex32 { re: self.as_f64() as f32, im: 0.0 }),
            TypeCode::Fc64 => Scalar::Fc64(Complex64 { re: self.as_f64(), im: 0.0 }),
        }
    }

    /// `self` truncated into an `i128`, for the integer arithmetic pivot
    /// `eval`'s binary-op dispatch uses. Floats truncate toward zero;
    /// complex values contribute only their real part.
    pub(crate) fn as_i128_lossy(self) -> i128 {
        match self {
            Scalar::Bool(v) => v as i128,
            Scalar::Int8(v) => v as i128,
            Scalar::Int16(v) => v as i128,
            Scalar::Int32(v) => v as i128,
            Scalar::Int64(v) => v as i128,
            Scalar::Uint8(v) => v as i128,
            Scalar::Uint16(v) => v as i128,
            Scalar::Uint32(v) => v as i128,
            Scalar::Uint64(v) => v as i128,
            Scalar::Fp32(v) => v as i128,
            Scalar::Fp64(v) => v as i128,
            Scalar::Fc32(v) => v.re as i128,
            Scalar::Fc64(v) => v.re as i128,
        }
    }

    /// The type code this value was decoded/cast into.
    pub fn code(self) -> TypeCode {
        match self {
            Scalar::Bool(_) => TypeCode::Bool,
            Scalar::Int8(_) => TypeCode::Int8,
            Scalar::Int16(_) => TypeCode::Int16,
            Scalar::Int32(_) => TypeCode::Int32,
            Scalar::Int64(_) => TypeCode::Int64,
            Scalar::Uint8(_) => TypeCode::Uint8,
            Scalar::Uint16(_) => TypeCode::Uint16,
            Scalar::Uint32(_) => TypeCode::Uint32,
            Scalar::Uint64(_) => TypeCode::Uint64,
            Scalar::Fp32(_) => TypeCode::Fp32,
            Scalar::Fp64(_) => TypeCode::Fp64,
            Scalar::Fc32(_) => TypeCode::Fc32,
            Scalar::Fc64(_) => TypeCode::Fc64,
        }
    }
}

/// Cast `src` (of type `from`) into `dst` (of type `to`).
///
/// `dst` and `src` must be exactly `to.size()` and `from.size()` bytes
/// long respectively. Identical codes take a `memcpy` fast path;
/// everything else goes through the `Scalar` pivot.
pub fn cast(to: TypeCode, from: TypeCode, dst: &mut [u8], src: &[u8]) {
    if to == from {
        dst.copy_from_slice(src);
        return;
    }
    Scalar::decode(from, src).cast_to(to).encode(dst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_codes_are_byte_copies() {
        let src = 42i32.to_ne_bytes();
        let mut dst = [0u8; 4];
        cast(TypeCode::Int32, TypeCode::Int32, &mut dst, &src);
        assert_eq!(dst, src);
    }

    #[test]
    fn cross_type_cast_follows_truncating_semantics() {
        let src = 1000i32.to_ne_bytes();
        let mut dst = [0u8; 1];
        cast(TypeCode::Int8, TypeCode::Int32, &mut dst, &src);
        assert_eq!(i8::from_ne_bytes(dst), 1000i32 as i8);
    }

    #[test]
    fn float_to_bool_is_nonzero_test() {
        let src = 0.0f64.to_ne_bytes();
        let mut dst = [0u8; 1];
        cast(TypeCode::Bool, TypeCode::Fp64, &mut dst, &src);
        assert_eq!(dst[0], 0);

        let src = 3.5f64.to_ne_bytes();
        cast(TypeCode::Bool, TypeCode::Fp64, &mut dst, &src);
        assert_eq!(dst[0], 1);
    }

    #[test]
    fn complex_to_real_drops_imaginary_part() {
        let c = Complex64 { re: 2.0, im: 9.0 };
        let mut src = [0u8; 16];
        c.re.to_ne_bytes().iter().enumerate().for_each(|(i, b)| src[i] = *b);
        c.im.to_ne_bytes().iter().enumerate().for_each(|(i, b)| src[8 + i] = *b);
        let mut dst = [0u8; 8];
        cast(TypeCode::Fp64, TypeCode::Fc64, &mut dst, &src);
        assert_eq!(f64::from_ne_bytes(dst), 2.0);
    }
}
