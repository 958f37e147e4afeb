use grb_types::TypeCode;

use crate::cast::Scalar;
use crate::opcode::{BinaryOpcode, UnaryOpcode};

/// Evaluate a non-positional binary opcode over two already-cast operands.
///
/// Callers are responsible for casting `x` and `y` to the operator's
/// declared `x_type`/`y_type` first (the registry in `grb-core` does this
/// via `grb_asm::cast`); `x` and `y` must carry the same [`TypeCode`] here,
/// matching the monoid constraint `add.z == x_type == y_type` that every
/// built-in binary op other than the comparison family respects.
///
/// Positional opcodes (`FirstI`, `SecondJ`, ...) read `(i, j)` rather than
/// operand values and panic here; evaluate them with [`apply_positional`]
/// instead.
pub fn apply_binary(op: BinaryOpcode, x: Scalar, y: Scalar) -> Scalar {
    use BinaryOpcode::*;

    let code = x.code();
    debug_assert_eq!(
        code,
        y.code(),
        "apply_binary requires operands already cast to a common type"
    );

    match op {
        First => x,
        Second => y,
        Any => x,
        Pair => one_of(code),
        Plus | Minus | RMinus | Times | Div | RDiv | Min | Max | Pow => arith(op, code, x, y),
        IsEq | IsNe | IsGt | IsLt | IsGe | IsLe => {
            let b = compare(op, code, x, y);
            encode_bool_as(code, b)
        }
        Eq | Ne | Gt | Lt | Ge | Le => Scalar::Bool(compare(op, code, x, y)),
        Lor | Land | Lxor => {
            let (a, b) = (as_bool(x), as_bool(y));
            Scalar::Bool(match op {
                Lor => a || b,
                Land => a && b,
                Lxor => a ^ b,
                _ => unreachable!(),
            })
        }
        Bor | Band | Bxor | Bxnor => bitwise(op, code, x, y),
        FirstI | FirstI1 | FirstJ | FirstJ1 | SecondI | SecondI1 | SecondJ | SecondJ1 => {
            panic!("{op:?} is positional; use apply_positional")
        }
    }
}

/// Evaluate a positional binary opcode, which reads an `(i, j)` coordinate
/// pair instead of operand values.
///
/// `First*` variants read the coordinate of the op's first operand,
/// `Second*` the second; since both families compute the same function of
/// whichever pair they're given, the caller picks which matrix's `(i, j)`
/// to pass based on the `First`/`Second` distinction.
pub fn apply_positional(op: BinaryOpcode, i: u64, j: u64) -> i64 {
    use BinaryOpcode::*;
    match op {
        FirstI | SecondI => i as i64,
        FirstI1 | SecondI1 => i as i64 + 1,
        FirstJ | SecondJ => j as i64,
        FirstJ1 | SecondJ1 => j as i64 + 1,
        _ => panic!("{op:?} is not positional"),
    }
}

/// Evaluate a unary opcode.
pub fn apply_unary(op: UnaryOpcode, x: Scalar) -> Scalar {
    use UnaryOpcode::*;
    let code = x.code();
    match op {
        Identity => x,
        One => one_of(code),
        Ainv => negate(code, x),
        Minv => reciprocal(code, x),
        Abs => abs(code, x),
        Lnot => Scalar::Bool(!as_bool(x)),
        Bnot => bitwise_not(code, x),
        Sign => sign(code, x),
    }
}

fn is_float(code: TypeCode) -> bool {
    matches!(code, TypeCode::Fp32 | TypeCode::Fp64)
}

fn is_complex(code: TypeCode) -> bool {
    matches!(code, TypeCode::Fc32 | TypeCode::Fc64)
}

fn as_bool(s: Scalar) -> bool {
    match s {
        Scalar::Bool(b) => b,
        other => other.as_i128_lossy() != 0,
    }
}

fn as_i128(s: Scalar) -> i128 {
    match s {
        Scalar::Bool(b) => b as i128,
        Scalar::Int8(v) => v as i128,
        Scalar::Int16(v) => v as i128,
        Scalar::Int32(v) => v as i128,
        Scalar::Int64(v) => v as i128,
        Scalar::Uint8(v) => v as i128,
        Scalar::Uint16(v) => v as i128,
        Scalar::Uint32(v) => v as i128,
        Scalar::Uint64(v) => v as i128,
        _ => panic!("as_i128 called on a non-integer scalar"),
    }
}

fn encode_signed(code: TypeCode, v: i128) -> Scalar {
    match code {
        TypeCode::Bool => Scalar::Bool(v != 0),
        TypeCode::Int8 => Scalar::Int8(v as i8),
        TypeCode::Int16 => Scalar::Int16(v as i16),
        TypeCode::Int32 => Scalar::Int32(v as i32),
        TypeCode::Int64 => Scalar::Int64(v as i64),
        TypeCode::Uint8 => Scalar::Uint8(v as u8),
        TypeCode::Uint16 => Scalar::Uint16(v as u16),
        TypeCode::Uint32 => Scalar::Uint32(v as u32),
        TypeCode::Uint64 => Scalar::Uint64(v as u64),
        _ => panic!("encode_signed called with a non-integer code"),
    }
}

fn as_u64(s: Scalar) -> u64 {
    match s {
        Scalar::Uint8(v) => v as u64,
        Scalar::Uint16(v) => v as u64,
        Scalar::Uint32(v) => v as u64,
        Scalar::Uint64(v) => v,
        _ => panic!("as_u64 called on a non-unsigned scalar"),
    }
}

fn encode_u64(code: TypeCode, v: u64) -> Scalar {
    match code {
        TypeCode::Uint8 => Scalar::Uint8(v as u8),
        TypeCode::Uint16 => Scalar::Uint16(v as u16),
        TypeCode::Uint32 => Scalar::Uint32(v as u32),
        TypeCode::Uint64 => Scalar::Uint64(v),
        _ => panic!("encode_u64 called with a non-unsigned code"),
    }
}

fn one_of(code: TypeCode) -> Scalar {
    use grb_types::{Complex32, Complex64};
    match code {
        TypeCode::Bool => Scalar::Bool(true),
        TypeCode::Fp32 => Scalar::Fp32(1.0),
        TypeCode::Fp64 => Scalar::Fp64(1.0),
        TypeCode::Fc32 => Scalar::Fc32(Complex32 { re: 1.0, im: 0.0 }),
        TypeCode::Fc64 => Scalar::Fc64(Complex64 { re: 1.0, im: 0.0 }),
        _ => encode_signed(code, 1),
    }
}

fn encode_bool_as(code: TypeCode, value: bool) -> Scalar {
    if is_float(code) {
        arith_from_f64(code, if value { 1.0 } else { 0.0 })
    } else {
        encode_signed(code, value as i128)
    }
}

fn arith_from_f64(code: TypeCode, v: f64) -> Scalar {
    match code {
        TypeCode::Fp32 => Scalar::Fp32(v as f32),
        TypeCode::Fp64 => Scalar::Fp64(v),
        _ => unreachable!(),
    }
}

fn arith(op: BinaryOpcode, code: TypeCode, x: Scalar, y: Scalar) -> Scalar {
    use BinaryOpcode::*;
    if is_float(code) {
        let (a, b) = (x.as_f64_lossy(), y.as_f64_lossy());
        let z = match op {
            Plus => a + b,
            Minus => a - b,
            RMinus => b - a,
            Times => a * b,
            Div => a / b,
            RDiv => b / a,
            Min => a.min(b),
            Max => a.max(b),
            Pow => a.powf(b),
            _ => unreachable!(),
        };
        arith_from_f64(code, z)
    } else if is_complex(code) {
        complex_arith(op, code, x, y)
    } else {
        let (a, b) = (as_i128(x), as_i128(y));
        let z = match op {
            Plus => a.wrapping_add(b),
            Minus => a.wrapping_sub(b),
            RMinus => b.wrapping_sub(a),
            Times => a.wrapping_mul(b),
            Div => {
                if b == 0 {
                    0
                } else {
                    a.wrapping_div(b)
                }
            }
            RDiv => {
                if a == 0 {
                    0
                } else {
                    b.wrapping_div(a)
                }
            }
            Min => a.min(b),
            Max => a.max(b),
            Pow => a.checked_pow(b.max(0) as u32).unwrap_or(0),
            _ => unreachable!(),
        };
        encode_signed(code, z)
    }
}

fn complex_arith(op: BinaryOpcode, code: TypeCode, x: Scalar, y: Scalar) -> Scalar {
    use grb_types::{Complex32, Complex64};
    match (x, y) {
        (Scalar::Fc32(a), Scalar::Fc32(b)) => {
            let (re, im) = complex_op(op, a.re as f64, a.im as f64, b.re as f64, b.im as f64);
            Scalar::Fc32(Complex32 {
                re: re as f32,
                im: im as f32,
            })
        }
        (Scalar::Fc64(a), Scalar::Fc64(b)) => {
            let (re, im) = complex_op(op, a.re, a.im, b.re, b.im);
            Scalar::Fc64(Complex64 { re, im })
        }
        _ => panic!("complex_arith called with a non-complex pair for {code:?}"),
    }
}

fn complex_op(op: BinaryOpcode, ar: f64, ai: f64, br: f64, bi: f64) -> (f64, f64) {
    use BinaryOpcode::*;
    match op {
        Plus => (ar + br, ai + bi),
        Minus => (ar - br, ai - bi),
        RMinus => (br - ar, bi - ai),
        Times => (ar * br - ai * bi, ar * bi + ai * br),
        _ => panic!("{op:?} is not a supported complex operation"),
    }
}

fn compare(op: BinaryOpcode, code: TypeCode, x: Scalar, y: Scalar) -> bool {
    use BinaryOpcode::*;
    let ord = if is_float(code) {
        x.as_f64_lossy().partial_cmp(&y.as_f64_lossy())
    } else {
        as_i128(x).partial_cmp(&as_i128(y))
    };
    let Some(ord) = ord else { return false };
    match op {
        Eq | IsEq => ord.is_eq(),
        Ne | IsNe => ord.is_ne(),
        Gt | IsGt => ord.is_gt(),
        Lt | IsLt => ord.is_lt(),
        Ge | IsGe => ord.is_ge(),
        Le | IsLe => ord.is_le(),
        _ => unreachable!(),
    }
}

fn bitwise(op: BinaryOpcode, code: TypeCode, x: Scalar, y: Scalar) -> Scalar {
    use BinaryOpcode::*;
    let (a, b) = (as_u64(x), as_u64(y));
    let z = match op {
        Bor => a | b,
        Band => a & b,
        Bxor => a ^ b,
        Bxnor => !(a ^ b),
        _ => unreachable!(),
    };
    encode_u64(code, z)
}

fn bitwise_not(code: TypeCode, x: Scalar) -> Scalar {
    encode_u64(code, !as_u64(x))
}

fn negate(code: TypeCode, x: Scalar) -> Scalar {
    if is_float(code) {
        arith_from_f64(code, -x.as_f64_lossy())
    } else if is_complex(code) {
        match x {
            Scalar::Fc32(v) => Scalar::Fc32(grb_types::Complex32 {
                re: -v.re,
                im: -v.im,
            }),
            Scalar::Fc64(v) => Scalar::Fc64(grb_types::Complex64 {
                re: -v.re,
                im: -v.im,
            }),
            _ => unreachable!(),
        }
    } else {
        encode_signed(code, as_i128(x).wrapping_neg())
    }
}

fn reciprocal(code: TypeCode, x: Scalar) -> Scalar {
    if is_float(code) {
        arith_from_f64(code, 1.0 / x.as_f64_lossy())
    } else {
        let v = as_i128(x);
        encode_signed(code, if v == 0 { 0 } else { 1 / v })
    }
}

fn abs(code: TypeCode, x: Scalar) -> Scalar {
    if is_float(code) {
        arith_from_f64(code, x.as_f64_lossy().abs())
    } else {
        encode_signed(code, as_i128(x).wrapping_abs())
    }
}

fn sign(code: TypeCode, x: Scalar) -> Scalar {
    if is_float(code) {
        let v = x.as_f64_lossy();
        arith_from_f64(code, if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 })
    } else {
        let v = as_i128(x);
        encode_signed(code, v.signum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_times_wrap_per_declared_width() {
        let z = apply_binary(BinaryOpcode::Plus, Scalar::Int8(120), Scalar::Int8(10));
        assert_eq!(z, Scalar::Int8(120i8.wrapping_add(10)));
    }

    #[test]
    fn min_plus_style_shortest_path_step() {
        let z = apply_binary(BinaryOpcode::Min, Scalar::Fp64(3.0), Scalar::Fp64(5.0));
        assert_eq!(z, Scalar::Fp64(3.0));
    }

    #[test]
    fn pair_is_one_regardless_of_operands() {
        assert_eq!(
            apply_binary(BinaryOpcode::Pair, Scalar::Int32(42), Scalar::Int32(-9)),
            Scalar::Int32(1)
        );
    }

    #[test]
    fn comparison_family_produces_bool_or_same_typed_flag() {
        assert_eq!(
            apply_binary(BinaryOpcode::Gt, Scalar::Int32(5), Scalar::Int32(3)),
            Scalar::Bool(true)
        );
        assert_eq!(
            apply_binary(BinaryOpcode::IsGt, Scalar::Int32(5), Scalar::Int32(3)),
            Scalar::Int32(1)
        );
    }

    #[test]
    fn bitwise_ops_are_unsigned_only() {
        assert_eq!(
            apply_binary(BinaryOpcode::Band, Scalar::Uint8(0b1100), Scalar::Uint8(0b1010)),
            Scalar::Uint8(0b1000)
        );
    }

    #[test]
    fn positional_opcodes_read_coordinates_not_values() {
        assert_eq!(apply_positional(BinaryOpcode::FirstI, 3, 9), 3);
        assert_eq!(apply_positional(BinaryOpcode::FirstJ1, 3, 9), 10);
    }

    #[test]
    fn unary_ainv_and_abs() {
        assert_eq!(apply_unary(UnaryOpcode::Ainv, Scalar::Int32(5)), Scalar::Int32(-5));
        assert_eq!(apply_unary(UnaryOpcode::Abs, Scalar::Int32(-5)), Scalar::Int32(5));
        assert_eq!(apply_unary(UnaryOpcode::Sign, Scalar::Fp64(-8.0)), Scalar::Fp64(-1.0));
    }
}
