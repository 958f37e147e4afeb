use crate::opcode::BinaryOpcode;
use grb_types::TypeCode;

/// Describes the identity element a canonical built-in monoid uses, without
/// committing to a concrete byte encoding (that's `grb-core::registry`'s
/// job, since it owns the typed identity buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// The type's additive identity (`0`, `0.0`, or all-zero bit pattern).
    Zero,
    /// The type's multiplicative identity (`1`, `1.0`).
    One,
    /// Boolean `true`.
    True,
    /// Boolean `false`.
    False,
    /// The type's minimum representable value (identity of `max`).
    MinValue,
    /// The type's maximum representable value (identity of `min`).
    MaxValue,
    /// All bits zero (identity of bitwise `or`/`xor`).
    AllBitsZero,
    /// All bits set (identity of bitwise `and`/`xnor`).
    AllBitsSet,
    /// The `any` monoid: idempotent and identity-free in the usual sense;
    /// any present value acts as its own identity, so reductions may
    /// short-circuit on the first entry seen.
    Any,
}

fn is_real10(ty: TypeCode) -> bool {
    matches!(
        ty,
        TypeCode::Int8
            | TypeCode::Int16
            | TypeCode::Int32
            | TypeCode::Int64
            | TypeCode::Uint8
            | TypeCode::Uint16
            | TypeCode::Uint32
            | TypeCode::Uint64
            | TypeCode::Fp32
            | TypeCode::Fp64
    )
}

fn is_unsigned(ty: TypeCode) -> bool {
    matches!(
        ty,
        TypeCode::Uint8 | TypeCode::Uint16 | TypeCode::Uint32 | TypeCode::Uint64
    )
}

/// Look up the canonical built-in monoid for `(op, ty)`, if one exists.
///
/// The table is closed: the 10 real types each support
/// `min`/`max`/`plus`/`times`; all 13 built-ins support `any`; `bool`
/// additionally supports `lor`/`land`/`lxor`/`eq` (`eq` standing in for
/// `lxnor`, since the two coincide over booleans); the four unsigned
/// integer types additionally support `bor`/`band`/`bxor`/`bxnor`. Every
/// other combination returns `None` ("no monoid").
pub fn canonical_monoid(op: BinaryOpcode, ty: TypeCode) -> Option<IdentityKind> {
    use BinaryOpcode::*;
    match op {
        Min if is_real10(ty) => Some(IdentityKind::MaxValue),
        Max if is_real10(ty) => Some(IdentityKind::MinValue),
        Plus if is_real10(ty) => Some(IdentityKind::Zero),
        Times if is_real10(ty) => Some(IdentityKind::One),
        Any => Some(IdentityKind::Any),
        Lor if ty == TypeCode::Bool => Some(IdentityKind::False),
        Land if ty == TypeCode::Bool => Some(IdentityKind::True),
        Lxor if ty == TypeCode::Bool => Some(IdentityKind::False),
        Eq if ty == TypeCode::Bool => Some(IdentityKind::True),
        Bor if is_unsigned(ty) => Some(IdentityKind::AllBitsZero),
        Band if is_unsigned(ty) => Some(IdentityKind::AllBitsSet),
        Bxor if is_unsigned(ty) => Some(IdentityKind::AllBitsZero),
        Bxnor if is_unsigned(ty) => Some(IdentityKind::AllBitsSet),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_times_min_max_cover_the_ten_real_types() {
        for ty in TypeCode::ALL {
            let expected = is_real10(ty);
            assert_eq!(canonical_monoid(BinaryOpcode::Plus, ty).is_some(), expected);
            assert_eq!(canonical_monoid(BinaryOpcode::Times, ty).is_some(), expected);
            assert_eq!(canonical_monoid(BinaryOpcode::Min, ty).is_some(), expected);
            assert_eq!(canonical_monoid(BinaryOpcode::Max, ty).is_some(), expected);
        }
    }

    #[test]
    fn any_covers_all_thirteen_types() {
        for ty in TypeCode::ALL {
            assert_eq!(canonical_monoid(BinaryOpcode::Any, ty), Some(IdentityKind::Any));
        }
    }

    #[test]
    fn boolean_monoids_only_apply_to_bool() {
        assert_eq!(
            canonical_monoid(BinaryOpcode::Lor, TypeCode::Bool),
            Some(IdentityKind::False)
        );
        assert_eq!(canonical_monoid(BinaryOpcode::Lor, TypeCode::Int32), None);
        assert_eq!(
            canonical_monoid(BinaryOpcode::Eq, TypeCode::Bool),
            Some(IdentityKind::True)
        );
    }

    #[test]
    fn bitwise_monoids_only_apply_to_unsigned_types() {
        assert_eq!(
            canonical_monoid(BinaryOpcode::Band, TypeCode::Uint32),
            Some(IdentityKind::AllBitsSet)
        );
        assert_eq!(canonical_monoid(BinaryOpcode::Band, TypeCode::Int32), None);
    }

    #[test]
    fn unknown_combination_has_no_monoid() {
        assert_eq!(canonical_monoid(BinaryOpcode::Pow, TypeCode::Int32), None);
        assert_eq!(canonical_monoid(BinaryOpcode::FirstI, TypeCode::Int32), None);
    }
}
