//! Element-wise kernels: `eWiseAdd` (union) and `eWiseMult` (intersection).
//!
//! Both share one merge driver (`run`) parameterized by a [`Pattern`]
//! rather than duplicating the masked-accumulate-transpose plumbing twice.
//! The merge itself works over `(row, col) -> value` maps dumped from each
//! operand instead of a per-column two-pointer sweep — a coordinate-keyed
//! merge is the same relation computed less cleverly, and every entry
//! still gets visited exactly once per operand.

use std::collections::HashMap;

use grb_types::{Code, ElementType, TypeCode};

use crate::context::Context;
use crate::descriptor::{descriptor_get, Descriptor};
use crate::error::{GrbError, GrbResult};
use crate::registry::BinaryOp;

use super::build::{dump_tuples, rebuild_from_entries};
use super::transpose::transpose;
use super::{cast_buffer, Matrix};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Union,
    Intersect,
}

/// `C<M> ← accum(C, A ∪ B` via `op)`.
#[tracing::instrument(level = "debug", skip(c, mask, accum, op, a, b, desc))]
pub fn ewise_add(c: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, op: &BinaryOp, a: &Matrix, b: &Matrix, desc: Option<&Descriptor>) -> GrbResult<()> {
    run(c, mask, accum, op, a, b, desc, Pattern::Union, "eWiseAdd")
}

/// `C<M> ← accum(C, A ∩ B` via `op)`.
#[tracing::instrument(level = "debug", skip(c, mask, accum, op, a, b, desc))]
pub fn ewise_mult(c: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, op: &BinaryOp, a: &Matrix, b: &Matrix, desc: Option<&Descriptor>) -> GrbResult<()> {
    run(c, mask, accum, op, a, b, desc, Pattern::Intersect, "eWiseMult")
}

fn run(c: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, op: &BinaryOp, a: &Matrix, b: &Matrix, desc: Option<&Descriptor>, pattern: Pattern, where_fn: &'static str) -> GrbResult<()> {
    let (resolved, ctx) = descriptor_get(desc, where_fn)?;
    let _: &Context = &ctx;

    let a_owned;
    let a_ref = if resolved.in0_transpose {
        a_owned = transpose(a);
        &a_owned
    } else {
        a
    };
    let b_owned;
    let b_ref = if resolved.in1_transpose {
        b_owned = transpose(b);
        &b_owned
    } else {
        b
    };

    if a_ref.nrows() != b_ref.nrows() || a_ref.ncols() != b_ref.ncols() {
        return Err(GrbError::DimensionMismatch {
            where_: where_fn,
            details: format!("operands are {}x{} and {}x{}", a_ref.nrows(), a_ref.ncols(), b_ref.nrows(), b_ref.ncols()),
        });
    }
    if c.nrows() != a_ref.nrows() || c.ncols() != a_ref.ncols() {
        return Err(GrbError::DimensionMismatch {
            where_: where_fn,
            details: format!("output is {}x{}, operands are {}x{}", c.nrows(), c.ncols(), a_ref.nrows(), a_ref.ncols()),
        });
    }

    let mask_is_empty = mask.map(|m| m.nvals() == 0).unwrap_or(true);
    let mask_allows_all = mask.is_none() || resolved.short_circuits_on_empty_mask(mask_is_empty);

    let z_ty = ElementType::builtin(op.z_type);
    let a_entries = dump_tuples(a_ref)?;
    let b_entries = dump_tuples(b_ref)?;
    let mut a_map: HashMap<(u64, u64), Vec<u8>> = HashMap::with_capacity(a_entries.len());
    for (r, col, x) in a_entries {
        a_map.insert((r, col), x);
    }
    let mut b_map: HashMap<(u64, u64), Vec<u8>> = HashMap::with_capacity(b_entries.len());
    for (r, col, x) in b_entries {
        b_map.insert((r, col), x);
    }

    let mut t: HashMap<(u64, u64), Vec<u8>> = HashMap::new();
    match pattern {
        Pattern::Union => {
            for (&key, av) in a_map.iter() {
                let out = match b_map.get(&key) {
                    Some(bv) => combine(op, key.0, key.1, &a_ref.ty, av, &b_ref.ty, bv)?,
                    None => cast_buffer(&a_ref.ty, &z_ty, av)?,
                };
                t.insert(key, out);
            }
            for (&key, bv) in b_map.iter() {
                if !a_map.contains_key(&key) {
                    t.insert(key, cast_buffer(&b_ref.ty, &z_ty, bv)?);
                }
            }
        }
        Pattern::Intersect => {
            for (&key, av) in a_map.iter() {
                if let Some(bv) = b_map.get(&key) {
                    t.insert(key, combine(op, key.0, key.1, &a_ref.ty, av, &b_ref.ty, bv)?);
                }
            }
        }
    }
    drop(a_map);
    drop(b_map);

    let mask_entries: HashMap<(u64, u64), Vec<u8>> = if mask_allows_all {
        HashMap::new()
    } else {
        let m = mask.expect("mask_allows_all is false only when a mask is present");
        dump_tuples(m)?.into_iter().map(|(r, col, x)| ((r, col), x)).collect()
    };

    let existing = if resolved.c_replace { Vec::new() } else { dump_tuples(c)? };
    let mut out_map: HashMap<(u64, u64), Vec<u8>> = existing.into_iter().map(|(r, col, x)| ((r, col), x)).collect();

    for (key, z_bytes) in t {
        let allowed = mask_allows_all || {
            match mask_entries.get(&key) {
                Some(mv) => {
                    let present = resolved.mask_struct || is_truthy(mask.unwrap().element_type(), mv);
                    present != resolved.mask_comp
                }
                None => resolved.mask_comp,
            }
        };
        if !allowed {
            continue;
        }
        let recast = cast_buffer(&z_ty, &c.ty, &z_bytes)?;
        let final_bytes = match (accum, out_map.get(&key)) {
            (Some(acc), Some(existing_bytes)) => {
                let mut out = vec![0u8; acc.z_type.size()];
                let x = cast_buffer(&c.ty, &ElementType::builtin(acc.x_type), existing_bytes)?;
                let y = cast_buffer(&c.ty, &ElementType::builtin(acc.y_type), &recast)?;
                acc.apply(&x, &y, &mut out);
                cast_buffer(&ElementType::builtin(acc.z_type), &c.ty, &out)?
            }
            _ => recast,
        };
        out_map.insert(key, final_bytes);
    }

    let rebuilt = rebuild_from_entries(c, out_map.into_iter().map(|((r, col), x)| (r, col, x)).collect())?;
    *c = rebuilt;
    Ok(())
}

fn combine(op: &BinaryOp, i: u64, j: u64, a_ty: &ElementType, av: &[u8], b_ty: &ElementType, bv: &[u8]) -> GrbResult<Vec<u8>> {
    let mut out = vec![0u8; op.z_type.size()];
    if op.is_positional() {
        op.apply_positional(i, j, &mut out);
        return Ok(out);
    }
    let x = cast_buffer(a_ty, &ElementType::builtin(op.x_type), av)?;
    let y = cast_buffer(b_ty, &ElementType::builtin(op.y_type), bv)?;
    op.apply(&x, &y, &mut out);
    Ok(out)
}

fn is_truthy(ty: &ElementType, bytes: &[u8]) -> bool {
    match ty.code() {
        Code::Builtin(TypeCode::Bool) => bytes[0] != 0,
        Code::Builtin(code) => {
            let mut b = [0u8; 1];
            grb_asm::cast(TypeCode::Bool, code, &mut b, bytes);
            b[0] != 0
        }
        Code::UserDefined(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use grb_types::TypeCode as T;

    use super::super::SparsityControl;
    use super::*;
    use crate::registry::new_binary_builtin;

    fn scalar_matrix(ty: T, nrows: u64, ncols: u64, entries: &[(u64, u64, i32)]) -> Matrix {
        let mut m = Matrix::new(ElementType::builtin(ty), nrows, ncols, SparsityControl::AUTO).unwrap();
        for &(i, j, v) in entries {
            m.set_element(i, j, v).unwrap();
        }
        m.wait().unwrap();
        m
    }

    #[test]
    fn ewise_add_unions_patterns() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 2)]);
        let b = scalar_matrix(T::Int32, 2, 2, &[(0, 1, 5), (1, 1, 9)]);
        let plus = new_binary_builtin(grb_asm::BinaryOpcode::Plus, T::Int32, T::Int32, T::Int32);
        let mut c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        ewise_add(&mut c, None, None, &plus, &a, &b, None).unwrap();
        assert_eq!(c.nvals(), 3);
        let v: i32 = c.extract_element(0, 1).unwrap().unwrap();
        assert_eq!(v, 7);
        let v: i32 = c.extract_element(0, 0).unwrap().unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn ewise_mult_keeps_only_intersection() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 2)]);
        let b = scalar_matrix(T::Int32, 2, 2, &[(0, 1, 5), (1, 1, 9)]);
        let times = new_binary_builtin(grb_asm::BinaryOpcode::Times, T::Int32, T::Int32, T::Int32);
        let mut c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        ewise_mult(&mut c, None, None, &times, &a, &b, None).unwrap();
        assert_eq!(c.nvals(), 1);
        let v: i32 = c.extract_element(0, 1).unwrap().unwrap();
        assert_eq!(v, 10);
    }

    #[test]
    fn complemented_mask_blocks_masked_coordinate() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (1, 1, 4)]);
        let b = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (1, 1, 4)]);
        let plus = new_binary_builtin(grb_asm::BinaryOpcode::Plus, T::Int32, T::Int32, T::Int32);
        let mask = scalar_matrix(T::Bool, 2, 2, &[(0, 0, 1)]);
        let mut desc = Descriptor::new();
        desc.mask.complement = true;
        let mut c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        ewise_add(&mut c, Some(&mask), None, &plus, &a, &b, Some(&desc)).unwrap();
        assert_eq!(c.nvals(), 1);
        assert!(c.extract_element::<i32>(0, 0).unwrap().is_none());
        let v: i32 = c.extract_element(1, 1).unwrap().unwrap();
        assert_eq!(v, 8);
    }
}
