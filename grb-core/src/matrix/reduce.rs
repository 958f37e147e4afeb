//! Reduction to a scalar or to a vector, the monoid-folding sibling of
//! `mxm`: [`reduce_to_scalar`] folds every entry with a monoid down to
//! one value; [`reduce_to_vector`] folds each row (or column) down to
//! one entry of a result, represented the same way `mxv`/`vxm` treat
//! vectors — as an `n x 1` (or `1 x n`) matrix.

use std::collections::HashMap;

use grb_types::{ElementType, GrbScalar};

use crate::descriptor::{descriptor_get, Descriptor};
use crate::error::GrbResult;
use crate::registry::{BinaryOp, Monoid};

use super::build::{dump_tuples, rebuild_from_entries};
use super::{cast_buffer, decode_scalar, Matrix};

/// `GrB_Matrix_reduce_Scalar`: fold every present entry of `a` with
/// `monoid`'s op, starting from its identity and short-circuiting at its
/// terminal value if one exists. `existing`/`accum` mirror the
/// input-output scalar of the real call: when both are given, the fold's
/// result is combined with `existing` via `accum` rather than replacing
/// it outright. Resolves `a`'s pending work first.
pub fn reduce_to_scalar<T: GrbScalar + Copy>(a: &mut Matrix, existing: Option<T>, accum: Option<&BinaryOp>, monoid: &Monoid) -> GrbResult<T> {
    if a.needs_wait() {
        a.wait()?;
    }
    let z_ty = ElementType::builtin(monoid.value_type());
    let mut acc = monoid.identity.clone();
    for (_, _, bytes) in dump_tuples(a)? {
        let casted = cast_buffer(&a.ty, &z_ty, &bytes)?;
        let mut out = vec![0u8; monoid.op.z_type.size()];
        monoid.op.apply(&acc, &casted, &mut out);
        acc = out;
        if monoid.terminal.as_deref() == Some(acc.as_slice()) {
            break;
        }
    }
    let result_ty = ElementType::builtin(T::TYPE_CODE);
    let folded: T = decode_scalar(&cast_buffer(&z_ty, &result_ty, &acc)?);
    match (accum, existing) {
        (Some(op), Some(prev)) => {
            let prev_bytes = super::encode_scalar(prev);
            let folded_bytes = super::encode_scalar(folded);
            let x = cast_buffer(&result_ty, &ElementType::builtin(op.x_type), &prev_bytes)?;
            let y = cast_buffer(&result_ty, &ElementType::builtin(op.y_type), &folded_bytes)?;
            let mut out = vec![0u8; op.z_type.size()];
            op.apply(&x, &y, &mut out);
            Ok(decode_scalar(&cast_buffer(&ElementType::builtin(op.z_type), &result_ty, &out)?))
        }
        _ => Ok(folded),
    }
}

/// `GrB_Matrix_reduce_Monoid` (vector form): fold each row (`by_row =
/// true`) or column of `a` to one entry of `y`, an `n x 1` or `1 x n`
/// matrix, masked and accumulated the same way `eWiseAdd`/`mxm` are.
pub fn reduce_to_vector(y: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, monoid: &Monoid, a: &Matrix, by_row: bool, desc: Option<&Descriptor>) -> GrbResult<()> {
    let (resolved, _ctx) = descriptor_get(desc, "reduce_to_vector")?;

    let z_ty = ElementType::builtin(monoid.value_type());
    let mut per_line: HashMap<u64, Vec<u8>> = HashMap::new();
    for (r, c, bytes) in dump_tuples(a)? {
        let key = if by_row { r } else { c };
        let casted = cast_buffer(&a.ty, &z_ty, &bytes)?;
        let combined = match per_line.remove(&key) {
            None => casted,
            Some(prev) => {
                let mut out = vec![0u8; monoid.op.z_type.size()];
                monoid.op.apply(&prev, &casted, &mut out);
                out
            }
        };
        per_line.insert(key, combined);
    }

    let mask_is_empty = mask.map(|m| m.nvals() == 0).unwrap_or(true);
    let mask_allows_all = mask.is_none() || resolved.short_circuits_on_empty_mask(mask_is_empty);
    let mask_entries: HashMap<u64, Vec<u8>> = if mask_allows_all {
        HashMap::new()
    } else {
        let m = mask.expect("mask_allows_all is false only when a mask is present");
        dump_tuples(m)?.into_iter().map(|(r, c, x)| (if by_row { r } else { c }, x)).collect()
    };

    let existing = if resolved.c_replace { Vec::new() } else { dump_tuples(y)? };
    let mut out_map: HashMap<u64, Vec<u8>> = existing.into_iter().map(|(r, c, x)| (if by_row { r } else { c }, x)).collect();

    for (key, z_bytes) in per_line {
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
        let recast = cast_buffer(&z_ty, &y.ty, &z_bytes)?;
        let final_bytes = match (accum, out_map.get(&key)) {
            (Some(op), Some(existing_bytes)) => {
                let mut out = vec![0u8; op.z_type.size()];
                let x = cast_buffer(&y.ty, &ElementType::builtin(op.x_type), existing_bytes)?;
                let yv = cast_buffer(&y.ty, &ElementType::builtin(op.y_type), &recast)?;
                op.apply(&x, &yv, &mut out);
                cast_buffer(&ElementType::builtin(op.z_type), &y.ty, &out)?
            }
            _ => recast,
        };
        out_map.insert(key, final_bytes);
    }

    let entries: Vec<(u64, u64, Vec<u8>)> = out_map.into_iter().map(|(k, x)| if by_row { (k, 0, x) } else { (0, k, x) }).collect();
    let rebuilt = rebuild_from_entries(y, entries)?;
    *y = rebuilt;
    Ok(())
}

fn is_truthy(ty: &ElementType, bytes: &[u8]) -> bool {
    use grb_types::{Code, TypeCode};
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
    use crate::registry::plus_times;

    fn scalar_matrix(ty: T, nrows: u64, ncols: u64, entries: &[(u64, u64, i32)]) -> Matrix {
        let mut m = Matrix::new(ElementType::builtin(ty), nrows, ncols, SparsityControl::AUTO).unwrap();
        for &(i, j, v) in entries {
            m.set_element(i, j, v).unwrap();
        }
        m.wait().unwrap();
        m
    }

    #[test]
    fn reduce_to_scalar_sums_all_entries() {
        let mut m = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 2), (1, 1, 3)]);
        let sr = plus_times(T::Int32).unwrap();
        let total: i32 = reduce_to_scalar(&mut m, None, None, &sr.add).unwrap();
        assert_eq!(total, 6);
    }

    #[test]
    fn reduce_to_scalar_accumulates_into_existing() {
        let mut m = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 2)]);
        let sr = plus_times(T::Int32).unwrap();
        let total: i32 = reduce_to_scalar(&mut m, Some(10), Some(&sr.mul), &sr.add).unwrap();
        assert_eq!(total, 30);
    }

    #[test]
    fn reduce_to_vector_sums_each_row() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 2), (1, 1, 5)]);
        let sr = plus_times(T::Int32).unwrap();
        let mut y = Matrix::new(ElementType::builtin(T::Int32), 2, 1, SparsityControl::AUTO).unwrap();
        reduce_to_vector(&mut y, None, None, &sr.add, &a, true, None).unwrap();
        let v: i32 = y.extract_element(0, 0).unwrap().unwrap();
        assert_eq!(v, 3);
        let v: i32 = y.extract_element(1, 0).unwrap().unwrap();
        assert_eq!(v, 5);
    }
}
