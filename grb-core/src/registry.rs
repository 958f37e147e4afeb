//! The typed operator/monoid/semiring registry.
//!
//! Built-in unary ops, binary ops and the canonical monoid family are
//! closed sets realized as plain Rust values rather than a runtime table —
//! `grb-asm` already enumerates the opcodes and evaluates them, so this
//! module's job is to pair an opcode with its type signature, validate the
//! combination (`new_monoid`/`new_semiring`'s typing checks) and dispatch
//! through `grb_asm::{apply_unary, apply_binary}` with casts inserted at
//! the boundary: a binary op with opcode `c` over result type `t` has at
//! most one canonical built-in monoid.
//!
//! User-defined operators extend a process-wide, append-only registry
//! behind a `parking_lot::RwLock`: immutable after first use except
//! through the explicit setters below.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use grb_asm::{apply_binary, apply_positional, apply_unary, canonical_monoid, BinaryOpcode, IdentityKind, Scalar, UnaryOpcode};
use grb_types::{Complex32, Complex64, TypeCode, UserTypeId};
use parking_lot::RwLock;

use crate::error::GrbError;

/// A user-defined operator's function body: raw bytes in, raw bytes out.
/// Built-in ops never take this path — they dispatch through
/// `grb_asm::apply_unary`/`apply_binary` over the `Scalar` pivot instead.
pub type OpaqueUnaryFn = Arc<dyn Fn(&[u8], &mut [u8]) + Send + Sync>;
/// See [`OpaqueUnaryFn`].
pub type OpaqueBinaryFn = Arc<dyn Fn(&[u8], &[u8], &mut [u8]) + Send + Sync>;

#[derive(Clone)]
enum UnaryBody {
    Builtin(UnaryOpcode),
    Opaque(OpaqueUnaryFn),
}

#[derive(Clone)]
enum BinaryBody {
    Builtin(BinaryOpcode),
    Opaque(OpaqueBinaryFn),
}

/// `{z_type, x_type, opcode, fn, name}`: a typed unary operator.
#[derive(Clone)]
pub struct UnaryOp {
    body: UnaryBody,
    /// Output type.
    pub z_type: TypeCode,
    /// Input type.
    pub x_type: TypeCode,
    /// Diagnostic name.
    pub name: &'static str,
}

impl UnaryOp {
    /// Evaluate `z = f(x)`. `x` must already be `x_type`-typed bytes;
    /// `dst` must be exactly `z_type.size()` bytes long.
    pub fn apply(&self, x: &[u8], dst: &mut [u8]) {
        match &self.body {
            UnaryBody::Builtin(op) => {
                let decoded = Scalar::decode(self.x_type, x);
                apply_unary(*op, decoded).cast_to(self.z_type).encode(dst);
            }
            UnaryBody::Opaque(f) => f(x, dst),
        }
    }
}

/// `{z_type, x_type, y_type, opcode, fn, name}`: a typed binary operator.
///
/// Positional ops (`FirstI`, `SecondJ`, ...) ignore operand bytes and read
/// an `(i, j)` coordinate pair via [`BinaryOp::apply_positional`] instead
/// of [`BinaryOp::apply`].
#[derive(Clone)]
pub struct BinaryOp {
    body: BinaryBody,
    /// Output type.
    pub z_type: TypeCode,
    /// First operand type.
    pub x_type: TypeCode,
    /// Second operand type.
    pub y_type: TypeCode,
    /// Diagnostic name.
    pub name: &'static str,
    positional: Option<BinaryOpcode>,
}

impl BinaryOp {
    /// `true` for the positional family; these may never back an
    /// accumulator or a monoid.
    pub fn is_positional(&self) -> bool {
        self.positional.is_some()
    }

    /// Evaluate `z = f(x, y)`. Panics if this op is positional — use
    /// [`BinaryOp::apply_positional`] for those.
    pub fn apply(&self, x: &[u8], y: &[u8], dst: &mut [u8]) {
        match &self.body {
            BinaryBody::Builtin(op) => {
                let xs = Scalar::decode(self.x_type, x);
                let ys = Scalar::decode(self.y_type, y).cast_to(self.x_type);
                apply_binary(*op, xs, ys).cast_to(self.z_type).encode(dst);
            }
            BinaryBody::Opaque(f) => f(x, y, dst),
        }
    }

    /// Evaluate a positional op's `(i, j)` reading. Panics if this op is
    /// not positional.
    pub fn apply_positional(&self, i: u64, j: u64, dst: &mut [u8]) {
        let op = self.positional.expect("apply_positional called on a non-positional BinaryOp");
        Scalar::Int64(apply_positional(op, i, j))
            .cast_to(self.z_type)
            .encode(dst);
    }
}

/// `{op, identity, terminal?}`: an associative binary op with an identity.
///
/// `op.z_type == op.x_type == op.y_type` is enforced at construction.
#[derive(Clone)]
pub struct Monoid {
    /// The associative binary op.
    pub op: BinaryOp,
    /// Encoded identity value, `op.z_type`-typed.
    pub identity: Vec<u8>,
    /// Encoded terminal (absorbing) value, if one exists for this monoid.
    pub terminal: Option<Vec<u8>>,
}

impl Monoid {
    /// The monoid's result/operand type.
    pub fn value_type(&self) -> TypeCode {
        self.op.z_type
    }
}

/// `{add, mul}`: a semiring, with `mul.z_type == add.value_type()`.
#[derive(Clone)]
pub struct Semiring {
    /// Additive monoid.
    pub add: Monoid,
    /// Multiplicative binary op.
    pub mul: BinaryOp,
}

/// Register a built-in unary op.
pub fn new_unary_builtin(opcode: UnaryOpcode, z_type: TypeCode, x_type: TypeCode) -> UnaryOp {
    UnaryOp {
        body: UnaryBody::Builtin(opcode),
        z_type,
        x_type,
        name: opcode.name(),
    }
}

/// Register a user-defined unary op over opaque byte buffers.
pub fn new_unary_opaque(f: OpaqueUnaryFn, z_type: TypeCode, x_type: TypeCode, name: &'static str) -> UnaryOp {
    UnaryOp {
        body: UnaryBody::Opaque(f),
        z_type,
        x_type,
        name,
    }
}

/// Register a built-in binary op.
pub fn new_binary_builtin(opcode: BinaryOpcode, z_type: TypeCode, x_type: TypeCode, y_type: TypeCode) -> BinaryOp {
    BinaryOp {
        body: BinaryBody::Builtin(opcode),
        z_type,
        x_type,
        y_type,
        name: opcode.name(),
        positional: opcode.is_positional().then_some(opcode),
    }
}

/// Register a user-defined binary op over opaque byte buffers.
pub fn new_binary_opaque(
    f: OpaqueBinaryFn,
    z_type: TypeCode,
    x_type: TypeCode,
    y_type: TypeCode,
    name: &'static str,
) -> BinaryOp {
    BinaryOp {
        body: BinaryBody::Opaque(f),
        z_type,
        x_type,
        y_type,
        name,
        positional: None,
    }
}

/// Build a monoid from `op` and an explicit identity, checking
/// `op.z_type == op.x_type == op.y_type`, that `op` isn't positional, and
/// that `identity` is `op.z_type`-typed.
pub fn new_monoid(op: BinaryOp, identity: Scalar) -> Result<Monoid, GrbError> {
    if op.is_positional() {
        return Err(GrbError::InvalidValue {
            where_: "new_monoid",
            details: format!("{} is positional and cannot back a monoid", op.name),
        });
    }
    if op.x_type != op.z_type || op.y_type != op.z_type {
        return Err(GrbError::DomainMismatch {
            where_: "new_monoid",
            details: "monoid requires op.z_type == op.x_type == op.y_type".into(),
        });
    }
    if identity.code() != op.z_type {
        return Err(GrbError::DomainMismatch {
            where_: "new_monoid",
            details: format!("identity type {:?} does not match op.z_type {:?}", identity.code(), op.z_type),
        });
    }
    let mut buf = vec![0u8; op.z_type.size()];
    identity.encode(&mut buf);
    Ok(Monoid {
        op,
        identity: buf,
        terminal: None,
    })
}

/// As [`new_monoid`], plus an explicit terminal (absorbing) value used to
/// short-circuit reductions.
pub fn new_monoid_with_terminal(op: BinaryOp, identity: Scalar, terminal: Scalar) -> Result<Monoid, GrbError> {
    let mut m = new_monoid(op, identity)?;
    if terminal.code() != m.op.z_type {
        return Err(GrbError::DomainMismatch {
            where_: "new_monoid",
            details: "terminal type does not match op.z_type".into(),
        });
    }
    let mut buf = vec![0u8; m.op.z_type.size()];
    terminal.encode(&mut buf);
    m.terminal = Some(buf);
    Ok(m)
}

/// Build a semiring from an additive monoid and a multiplicative binary
/// op, checking `mul.z_type == add.value_type()`.
pub fn new_semiring(add: Monoid, mul: BinaryOp) -> Result<Semiring, GrbError> {
    if mul.z_type != add.value_type() {
        return Err(GrbError::DomainMismatch {
            where_: "new_semiring",
            details: format!("mul.z_type {:?} does not match add.value_type() {:?}", mul.z_type, add.value_type()),
        });
    }
    Ok(Semiring { add, mul })
}

/// Look up the canonical built-in monoid for `(opcode, ty)` from a closed
/// lookup table: the 10 real types each support
/// `min`/`max`/`plus`/`times`; all 13 built-ins support `any`; `bool`
/// additionally supports `lor`/`land`/`lxor`/`eq`; the four unsigned
/// integer types additionally support `bor`/`band`/`bxor`/`bxnor`.
pub fn op_from_binary_to_monoid(opcode: BinaryOpcode, ty: TypeCode) -> Option<Monoid> {
    let kind = canonical_monoid(opcode, ty)?;
    let op = new_binary_builtin(opcode, ty, ty, ty);
    let identity = identity_scalar(kind, ty);
    let mut identity_buf = vec![0u8; ty.size()];
    identity.encode(&mut identity_buf);
    let terminal = terminal_scalar(opcode, ty).map(|t| {
        let mut buf = vec![0u8; ty.size()];
        t.encode(&mut buf);
        buf
    });
    Some(Monoid {
        op,
        identity: identity_buf,
        terminal,
    })
}

/// A handful of common built-in semirings, constructed eagerly: the pair
/// every graph-algorithm driver reaches for (`PLUS_TIMES`, `MIN_PLUS`,
/// `MAX_PLUS`, `LOR_LAND`, `ANY_PAIR`) over the 10 real types / bool.
pub fn plus_times(ty: TypeCode) -> Option<Semiring> {
    let add = op_from_binary_to_monoid(BinaryOpcode::Plus, ty)?;
    let mul = new_binary_builtin(BinaryOpcode::Times, ty, ty, ty);
    new_semiring(add, mul).ok()
}

/// `min_plus`: the shortest-path semiring.
pub fn min_plus(ty: TypeCode) -> Option<Semiring> {
    let add = op_from_binary_to_monoid(BinaryOpcode::Min, ty)?;
    let mul = new_binary_builtin(BinaryOpcode::Plus, ty, ty, ty);
    new_semiring(add, mul).ok()
}

/// `max_plus`.
pub fn max_plus(ty: TypeCode) -> Option<Semiring> {
    let add = op_from_binary_to_monoid(BinaryOpcode::Max, ty)?;
    let mul = new_binary_builtin(BinaryOpcode::Plus, ty, ty, ty);
    new_semiring(add, mul).ok()
}

/// `lor_land`: boolean reachability semiring (BFS-style drivers).
pub fn lor_land_bool() -> Semiring {
    let add = op_from_binary_to_monoid(BinaryOpcode::Lor, TypeCode::Bool).expect("lor/bool is canonical");
    let mul = new_binary_builtin(BinaryOpcode::Land, TypeCode::Bool, TypeCode::Bool, TypeCode::Bool);
    new_semiring(add, mul).expect("bool types match by construction")
}

fn identity_scalar(kind: IdentityKind, ty: TypeCode) -> Scalar {
    match kind {
        IdentityKind::Zero => zero_scalar(ty),
        IdentityKind::One => one_scalar(ty),
        IdentityKind::True => Scalar::Bool(true),
        IdentityKind::False => Scalar::Bool(false),
        IdentityKind::MinValue => min_value_scalar(ty),
        IdentityKind::MaxValue => max_value_scalar(ty),
        IdentityKind::AllBitsZero => all_bits_zero_scalar(ty),
        IdentityKind::AllBitsSet => all_bits_set_scalar(ty),
        // `any` is identity-free; zero is a harmless stand-in
        // since reductions over `any` short-circuit on the first entry
        // instead of ever consulting the identity value.
        IdentityKind::Any => zero_scalar(ty),
    }
}

fn terminal_scalar(opcode: BinaryOpcode, ty: TypeCode) -> Option<Scalar> {
    match opcode {
        BinaryOpcode::Lor => Some(Scalar::Bool(true)),
        BinaryOpcode::Land => Some(Scalar::Bool(false)),
        BinaryOpcode::Bor => Some(all_bits_set_scalar(ty)),
        BinaryOpcode::Band => Some(all_bits_zero_scalar(ty)),
        BinaryOpcode::Min => Some(min_value_scalar(ty)),
        BinaryOpcode::Max => Some(max_value_scalar(ty)),
        _ => None,
    }
}

fn zero_scalar(ty: TypeCode) -> Scalar {
    use TypeCode::*;
    match ty {
        Bool => Scalar::Bool(false),
        Int8 => Scalar::Int8(0),
        Int16 => Scalar::Int16(0),
        Int32 => Scalar::Int32(0),
        Int64 => Scalar::Int64(0),
        Uint8 => Scalar::Uint8(0),
        Uint16 => Scalar::Uint16(0),
        Uint32 => Scalar::Uint32(0),
        Uint64 => Scalar::Uint64(0),
        Fp32 => Scalar::Fp32(0.0),
        Fp64 => Scalar::Fp64(0.0),
        Fc32 => Scalar::Fc32(Complex32 { re: 0.0, im: 0.0 }),
        Fc64 => Scalar::Fc64(Complex64 { re: 0.0, im: 0.0 }),
    }
}

fn one_scalar(ty: TypeCode) -> Scalar {
    use TypeCode::*;
    match ty {
        Bool => Scalar::Bool(true),
        Int8 => Scalar::Int8(1),
        Int16 => Scalar::Int16(1),
        Int32 => Scalar::Int32(1),
        Int64 => Scalar::Int64(1),
        Uint8 => Scalar::Uint8(1),
        Uint16 => Scalar::Uint16(1),
        Uint32 => Scalar::Uint32(1),
        Uint64 => Scalar::Uint64(1),
        Fp32 => Scalar::Fp32(1.0),
        Fp64 => Scalar::Fp64(1.0),
        Fc32 => Scalar::Fc32(Complex32 { re: 1.0, im: 0.0 }),
        Fc64 => Scalar::Fc64(Complex64 { re: 1.0, im: 0.0 }),
    }
}

fn min_value_scalar(ty: TypeCode) -> Scalar {
    use TypeCode::*;
    match ty {
        Int8 => Scalar::Int8(i8::MIN),
        Int16 => Scalar::Int16(i16::MIN),
        Int32 => Scalar::Int32(i32::MIN),
        Int64 => Scalar::Int64(i64::MIN),
        Uint8 => Scalar::Uint8(u8::MIN),
        Uint16 => Scalar::Uint16(u16::MIN),
        Uint32 => Scalar::Uint32(u32::MIN),
        Uint64 => Scalar::Uint64(u64::MIN),
        Fp32 => Scalar::Fp32(f32::NEG_INFINITY),
        Fp64 => Scalar::Fp64(f64::NEG_INFINITY),
        _ => zero_scalar(ty),
    }
}

fn max_value_scalar(ty: TypeCode) -> Scalar {
    use TypeCode::*;
    match ty {
        Int8 => Scalar::Int8(i8::MAX),
        Int16 => Scalar::Int16(i16::MAX),
        Int32 => Scalar::Int32(i32::MAX),
        Int64 => Scalar::Int64(i64::MAX),
        Uint8 => Scalar::Uint8(u8::MAX),
        Uint16 => Scalar::Uint16(u16::MAX),
        Uint32 => Scalar::Uint32(u32::MAX),
        Uint64 => Scalar::Uint64(u64::MAX),
        Fp32 => Scalar::Fp32(f32::INFINITY),
        Fp64 => Scalar::Fp64(f64::INFINITY),
        _ => zero_scalar(ty),
    }
}

fn all_bits_zero_scalar(ty: TypeCode) -> Scalar {
    use TypeCode::*;
    match ty {
        Uint8 => Scalar::Uint8(0),
        Uint16 => Scalar::Uint16(0),
        Uint32 => Scalar::Uint32(0),
        Uint64 => Scalar::Uint64(0),
        _ => zero_scalar(ty),
    }
}

fn all_bits_set_scalar(ty: TypeCode) -> Scalar {
    use TypeCode::*;
    match ty {
        Uint8 => Scalar::Uint8(u8::MAX),
        Uint16 => Scalar::Uint16(u16::MAX),
        Uint32 => Scalar::Uint32(u32::MAX),
        Uint64 => Scalar::Uint64(u64::MAX),
        _ => zero_scalar(ty),
    }
}

/// Process-wide registry of user-defined types, extending the closed
/// built-in `TypeCode` set. Immutable after `init` except through this
/// append-only `register` call.
static USER_TYPES: OnceLock<RwLock<Vec<UserTypeRecord>>> = OnceLock::new();
static NEXT_USER_TYPE_ID: AtomicU32 = AtomicU32::new(0);

struct UserTypeRecord {
    size: usize,
    name: &'static str,
}

fn user_types() -> &'static RwLock<Vec<UserTypeRecord>> {
    USER_TYPES.get_or_init(|| RwLock::new(Vec::new()))
}

/// Register a new opaque user-defined type of `size` bytes, returning the
/// id to construct `ElementType::user_defined` values with.
///
/// Casting between two user-defined types is only defined when they're
/// the same id (trivial `memcpy`); any other
/// user-defined cast is rejected at op-construction time by the caller
/// (this registry only hands out ids, it doesn't itself build cast ops).
pub fn new_type(size: usize, name: &'static str) -> UserTypeId {
    let id = UserTypeId::from_raw(NEXT_USER_TYPE_ID.fetch_add(1, Ordering::Relaxed));
    user_types().write().push(UserTypeRecord { size, name });
    id
}

/// Size in bytes of a previously registered user-defined type.
pub fn user_type_size(id: UserTypeId) -> Option<usize> {
    user_types().read().get(id.raw() as usize).map(|r| r.size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_times_on_reals_is_a_valid_semiring() {
        let sr = plus_times(TypeCode::Fp64).unwrap();
        assert_eq!(sr.add.value_type(), TypeCode::Fp64);
        assert_eq!(sr.mul.z_type, TypeCode::Fp64);
    }

    #[test]
    fn min_plus_identity_is_positive_infinity() {
        let sr = min_plus(TypeCode::Fp64).unwrap();
        assert_eq!(f64::from_ne_bytes(sr.add.identity[..8].try_into().unwrap()), f64::INFINITY);
    }

    #[test]
    fn monoid_rejects_mismatched_operand_types() {
        let op = new_binary_builtin(BinaryOpcode::Plus, TypeCode::Int32, TypeCode::Int32, TypeCode::Int64);
        assert!(new_monoid(op, Scalar::Int32(0)).is_err());
    }

    #[test]
    fn monoid_rejects_positional_ops() {
        let op = new_binary_builtin(BinaryOpcode::FirstI, TypeCode::Int64, TypeCode::Int64, TypeCode::Int64);
        assert!(new_monoid(op, Scalar::Int64(0)).is_err());
    }

    #[test]
    fn semiring_rejects_mul_type_mismatch_with_add() {
        let add = op_from_binary_to_monoid(BinaryOpcode::Plus, TypeCode::Int32).unwrap();
        let mul = new_binary_builtin(BinaryOpcode::Times, TypeCode::Fp64, TypeCode::Fp64, TypeCode::Fp64);
        assert!(new_semiring(add, mul).is_err());
    }

    #[test]
    fn user_defined_types_get_unique_ids() {
        let a = new_type(16, "point2d");
        let b = new_type(16, "point2d");
        assert_ne!(a, b);
        assert_eq!(user_type_size(a), Some(16));
    }

    #[test]
    fn unknown_combination_has_no_builtin_monoid() {
        assert!(op_from_binary_to_monoid(BinaryOpcode::Pow, TypeCode::Int32).is_none());
    }
}
