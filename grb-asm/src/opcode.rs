/// Unary operator opcodes: `z = f(x)`.
///
/// One variant per atomic expression the engine knows how to generate
/// code for, mirroring the style of an instruction-set enum (one doc
/// comment per opcode) rather than one struct per operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[non_exhaustive]
pub enum UnaryOpcode {
    /// `z = x`.
    Identity = 0,
    /// `z = -x` (additive inverse).
    Ainv = 1,
    /// `z = 1/x` (multiplicative inverse).
    Minv = 2,
    /// `z = |x|`.
    Abs = 3,
    /// `z = 1`, regardless of `x`.
    One = 4,
    /// `z = !x` for booleans.
    Lnot = 5,
    /// `z = ~x`, bitwise complement, for unsigned integer types.
    Bnot = 6,
    /// `z = sign(x)`, one of `{-1, 0, 1}`.
    Sign = 7,
}

/// Binary operator opcodes: `z = f(x, y)`.
///
/// The positional variants (`FirstI`, `FirstJ`, ...) read `(i, j, k)`
/// rather than the operand values `x`/`y` and are forbidden as
/// accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[non_exhaustive]
pub enum BinaryOpcode {
    /// `z = x`.
    First = 0,
    /// `z = y`.
    Second = 1,
    /// `z = 1`, regardless of `x, y` ("oneb").
    Pair = 2,
    /// `z = x` or `z = y`, either is acceptable; used where only the
    /// pattern of the result matters.
    Any = 3,
    /// `z = x + y`.
    Plus = 4,
    /// `z = x - y`.
    Minus = 5,
    /// `z = y - x`.
    RMinus = 6,
    /// `z = x * y`.
    Times = 7,
    /// `z = x / y`.
    Div = 8,
    /// `z = y / x`.
    RDiv = 9,
    /// `z = min(x, y)`.
    Min = 10,
    /// `z = max(x, y)`.
    Max = 11,
    /// `z = x ** y`.
    Pow = 12,
    /// `z = (x == y)`, result typed as `x`'s type (not bool).
    IsEq = 13,
    /// `z = (x != y)`, result typed as `x`'s type.
    IsNe = 14,
    /// `z = (x > y)`, result typed as `x`'s type.
    IsGt = 15,
    /// `z = (x < y)`, result typed as `x`'s type.
    IsLt = 16,
    /// `z = (x >= y)`, result typed as `x`'s type.
    IsGe = 17,
    /// `z = (x <= y)`, result typed as `x`'s type.
    IsLe = 18,
    /// `z = (x == y)`, boolean result.
    Eq = 19,
    /// `z = (x != y)`, boolean result.
    Ne = 20,
    /// `z = (x > y)`, boolean result.
    Gt = 21,
    /// `z = (x < y)`, boolean result.
    Lt = 22,
    /// `z = (x >= y)`, boolean result.
    Ge = 23,
    /// `z = (x <= y)`, boolean result.
    Le = 24,
    /// `z = x || y`, boolean.
    Lor = 25,
    /// `z = x && y`, boolean.
    Land = 26,
    /// `z = x xor y`, boolean.
    Lxor = 27,
    /// `z = x | y`, bitwise, unsigned integer types.
    Bor = 28,
    /// `z = x & y`, bitwise, unsigned integer types.
    Band = 29,
    /// `z = x ^ y`, bitwise, unsigned integer types.
    Bxor = 30,
    /// `z = ~(x ^ y)`, bitwise, unsigned integer types.
    Bxnor = 31,
    /// `z = i`, the row index of the output entry (0-based).
    FirstI = 32,
    /// `z = i + 1`, the row index of the output entry (1-based).
    FirstI1 = 33,
    /// `z = j`, the column index of the output entry (0-based).
    FirstJ = 34,
    /// `z = j + 1`, the column index of the output entry (1-based).
    FirstJ1 = 35,
    /// `z = i` read from the second operand's coordinate.
    SecondI = 36,
    /// `z = i + 1` read from the second operand's coordinate.
    SecondI1 = 37,
    /// `z = j` read from the second operand's coordinate.
    SecondJ = 38,
    /// `z = j + 1` read from the second operand's coordinate.
    SecondJ1 = 39,
}

impl UnaryOpcode {
    /// Stable name, as used in registry diagnostics and persistence.
    pub const fn name(self) -> &'static str {
        match self {
            UnaryOpcode::Identity => "IDENTITY",
            UnaryOpcode::Ainv => "AINV",
            UnaryOpcode::Minv => "MINV",
            UnaryOpcode::Abs => "ABS",
            UnaryOpcode::One => "ONE",
            UnaryOpcode::Lnot => "LNOT",
            UnaryOpcode::Bnot => "BNOT",
            UnaryOpcode::Sign => "SIGN",
        }
    }
}

impl BinaryOpcode {
    /// Stable name, as used in registry diagnostics and persistence.
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOpcode::First => "FIRST",
            BinaryOpcode::Second => "SECOND",
            BinaryOpcode::Pair => "PAIR",
            BinaryOpcode::Any => "ANY",
            BinaryOpcode::Plus => "PLUS",
            BinaryOpcode::Minus => "MINUS",
            BinaryOpcode::RMinus => "RMINUS",
            BinaryOpcode::Times => "TIMES",
            BinaryOpcode::Div => "DIV",
            BinaryOpcode::RDiv => "RDIV",
            BinaryOpcode::Min => "MIN",
            BinaryOpcode::Max => "MAX",
            BinaryOpcode::Pow => "POW",
            BinaryOpcode::IsEq => "ISEQ",
            BinaryOpcode::IsNe => "ISNE",
            BinaryOpcode::IsGt => "ISGT",
            BinaryOpcode::IsLt => "ISLT",
            BinaryOpcode::IsGe => "ISGE",
            BinaryOpcode::IsLe => "ISLE",
            BinaryOpcode::Eq => "EQ",
            BinaryOpcode::Ne => "NE",
            BinaryOpcode::Gt => "GT",
            BinaryOpcode::Lt => "LT",
            BinaryOpcode::Ge => "GE",
            BinaryOpcode::Le => "LE",
            BinaryOpcode::Lor => "LOR",
            BinaryOpcode::Land => "LAND",
            BinaryOpcode::Lxor => "LXOR",
            BinaryOpcode::Bor => "BOR",
            BinaryOpcode::Band => "BAND",
            BinaryOpcode::Bxor => "BXOR",
            BinaryOpcode::Bxnor => "BXNOR",
            BinaryOpcode::FirstI => "FIRSTI",
            BinaryOpcode::FirstI1 => "FIRSTI1",
            BinaryOpcode::FirstJ => "FIRSTJ",
            BinaryOpcode::FirstJ1 => "FIRSTJ1",
            BinaryOpcode::SecondI => "SECONDI",
            BinaryOpcode::SecondI1 => "SECONDI1",
            BinaryOpcode::SecondJ => "SECONDJ",
            BinaryOpcode::SecondJ1 => "SECONDJ1",
        }
    }

    /// `true` for the `first*`/`second*` family, whose `fn` reads
    /// `(i, j, k)` instead of the operand values. Positional ops may never
    /// be used as an accumulator.
    pub const fn is_positional(self) -> bool {
        matches!(
            self,
            BinaryOpcode::FirstI
                | BinaryOpcode::FirstI1
                | BinaryOpcode::FirstJ
                | BinaryOpcode::FirstJ1
                | BinaryOpcode::SecondI
                | BinaryOpcode::SecondI1
                | BinaryOpcode::SecondJ
                | BinaryOpcode::SecondJ1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn positional_ops_are_exactly_the_first_second_ij_family() {
        let positional: Vec<_> = BinaryOpcode::iter().filter(|o| o.is_positional()).collect();
        assert_eq!(positional.len(), 8);
    }
}
