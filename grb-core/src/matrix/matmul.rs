//! Masked, accumulating semiring matrix multiply:
//! `mxm`/`mxv`/`vxm` share one driver, and the dot-product and saxpy
//! algorithms share one semiring-parametric inner update
//! ([`combine_product`]) rather than duplicating the multiply-accumulate
//! step per algorithm. `vxm`/`mxv` are thin reorderings of `mxm` — a row
//! or column vector is just a matrix with one of its dimensions equal to
//! one.

use std::collections::HashMap;

use grb_types::ElementType;

use crate::context::Context;
use crate::descriptor::{descriptor_get, AxbMethod, Descriptor, ResolvedDescriptor};
use crate::error::{GrbError, GrbResult};
use crate::registry::{BinaryOp, Semiring};

use super::build::{dump_tuples, rebuild_from_entries};
use super::transpose::transpose;
use super::{cast_buffer, Matrix, Sparsity};

/// Which multiply algorithm [`select_axb`] picked. Both produce
/// identical results; they differ only in which index they group
/// products by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxbAlgorithm {
    /// Row-of-`A` dot column-of-`B`, one output entry at a time. Cheap
    /// when a mask (or a dense operand) already bounds the candidate
    /// `(i, j)` pairs.
    Dot,
    /// Accumulate `A(:, k) * B(k, :)` outer-product contributions across
    /// shared `k`. Cheap when both operands are sparse and no mask
    /// narrows the output ahead of time.
    Saxpy,
}

/// Pick an algorithm for `C = A (+,x) B`, honoring an explicit descriptor
/// hint and otherwise following operand/output density the way
/// SuiteSparse's real `GB_AxB_meta` does: a dot-product is cheap whenever
/// a lookup into `A` or `B` is already O(1) (bitmap/full format), since
/// then no grouping step is needed at all. Pure and independent of the
/// actual multiply, so it is unit-testable on its own.
pub fn select_axb(desc: &ResolvedDescriptor, a: &Matrix, b: &Matrix, c: &Matrix, _semiring: &Semiring) -> AxbAlgorithm {
    match desc.axb_method {
        AxbMethod::Dot => return AxbAlgorithm::Dot,
        AxbMethod::Gustavson | AxbMethod::Hash | AxbMethod::Saxpy => return AxbAlgorithm::Saxpy,
        AxbMethod::Default => {}
    }
    let dense_operand = matches!(a.format(), Sparsity::Bitmap | Sparsity::Full) || matches!(b.format(), Sparsity::Bitmap | Sparsity::Full);
    let dense_output = matches!(c.format(), Sparsity::Bitmap | Sparsity::Full);
    if dense_operand || dense_output {
        AxbAlgorithm::Dot
    } else {
        AxbAlgorithm::Saxpy
    }
}

/// `C<M> ← accum(C, A (+,x) B)`.
#[tracing::instrument(level = "debug", skip(c, mask, accum, semiring, a, b, desc))]
pub fn mxm(c: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, semiring: &Semiring, a: &Matrix, b: &Matrix, desc: Option<&Descriptor>) -> GrbResult<()> {
    run(c, mask, accum, semiring, a, b, desc, "mxm")
}

/// `y<M> ← accum(y, A (+,x) x)`: matrix-vector product, `x` a column
/// vector (an `n x 1` matrix).
pub fn mxv(y: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, semiring: &Semiring, a: &Matrix, x: &Matrix, desc: Option<&Descriptor>) -> GrbResult<()> {
    run(y, mask, accum, semiring, a, x, desc, "mxv")
}

/// `y<M> ← accum(y, x (+,x) A)`: vector-matrix product, `x` a row
/// vector (a `1 x n` matrix).
pub fn vxm(y: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, semiring: &Semiring, x: &Matrix, a: &Matrix, desc: Option<&Descriptor>) -> GrbResult<()> {
    run(y, mask, accum, semiring, x, a, desc, "vxm")
}

fn run(c: &mut Matrix, mask: Option<&Matrix>, accum: Option<&BinaryOp>, semiring: &Semiring, a: &Matrix, b: &Matrix, desc: Option<&Descriptor>, where_fn: &'static str) -> GrbResult<()> {
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

    if a_ref.ncols() != b_ref.nrows() {
        return Err(GrbError::DimensionMismatch {
            where_: where_fn,
            details: format!("inner dimensions {} and {} do not agree", a_ref.ncols(), b_ref.nrows()),
        });
    }
    if c.nrows() != a_ref.nrows() || c.ncols() != b_ref.ncols() {
        return Err(GrbError::DimensionMismatch {
            where_: where_fn,
            details: format!("output is {}x{}, expected {}x{}", c.nrows(), c.ncols(), a_ref.nrows(), b_ref.ncols()),
        });
    }

    let mask_is_empty = mask.map(|m| m.nvals() == 0).unwrap_or(true);
    let mask_allows_all = mask.is_none() || resolved.short_circuits_on_empty_mask(mask_is_empty);

    let algo = select_axb(&resolved, a_ref, b_ref, c, semiring);
    crate::config::burble_print(&format!("{where_fn}: algorithm {algo:?} chosen"));
    // A complemented mask's allowed set is the complement of its entries,
    // so its entries cannot narrow the dot-product candidate domain —
    // only an uncomplemented mask can be used that way.
    let dot_restrict = if mask_allows_all || resolved.mask_comp { None } else { mask };
    let t = match algo {
        AxbAlgorithm::Saxpy => saxpy(semiring, a_ref, b_ref)?,
        AxbAlgorithm::Dot => dot(semiring, a_ref, b_ref, dot_restrict)?,
    };

    let z_ty = ElementType::builtin(semiring.add.value_type());
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

/// `prod = a (x) b`, then folded into `acc` with the additive monoid if
/// one is already present. Shared between [`dot`] and [`saxpy`] so the
/// two algorithms can never disagree about how a contribution is formed.
fn combine_product(semiring: &Semiring, a_val: &[u8], b_val: &[u8], acc: Option<Vec<u8>>) -> Vec<u8> {
    let mut prod = vec![0u8; semiring.mul.z_type.size()];
    semiring.mul.apply(a_val, b_val, &mut prod);
    match acc {
        None => prod,
        Some(prev) => {
            let mut out = vec![0u8; semiring.add.op.z_type.size()];
            semiring.add.op.apply(&prev, &prod, &mut out);
            out
        }
    }
}

fn saxpy(semiring: &Semiring, a: &Matrix, b: &Matrix) -> GrbResult<HashMap<(u64, u64), Vec<u8>>> {
    let mut a_by_col: HashMap<u64, Vec<(u64, Vec<u8>)>> = HashMap::new();
    for (i, k, v) in dump_tuples(a)? {
        a_by_col.entry(k).or_default().push((i, v));
    }
    let mut b_by_row: HashMap<u64, Vec<(u64, Vec<u8>)>> = HashMap::new();
    for (k, j, v) in dump_tuples(b)? {
        b_by_row.entry(k).or_default().push((j, v));
    }

    let mut out: HashMap<(u64, u64), Vec<u8>> = HashMap::new();
    for (k, a_entries) in &a_by_col {
        let Some(b_entries) = b_by_row.get(k) else { continue };
        for (i, av) in a_entries {
            for (j, bv) in b_entries {
                let key = (*i, *j);
                let prev = out.remove(&key);
                out.insert(key, combine_product(semiring, av, bv, prev));
            }
        }
    }
    Ok(out)
}

fn dot(semiring: &Semiring, a: &Matrix, b: &Matrix, mask: Option<&Matrix>) -> GrbResult<HashMap<(u64, u64), Vec<u8>>> {
    let mut a_by_row: HashMap<u64, HashMap<u64, Vec<u8>>> = HashMap::new();
    for (i, k, v) in dump_tuples(a)? {
        a_by_row.entry(i).or_default().insert(k, v);
    }
    let mut b_by_col: HashMap<u64, HashMap<u64, Vec<u8>>> = HashMap::new();
    for (k, j, v) in dump_tuples(b)? {
        b_by_col.entry(j).or_default().insert(k, v);
    }

    let candidates: Vec<(u64, u64)> = match mask {
        Some(m) => dump_tuples(m)?.into_iter().map(|(i, j, _)| (i, j)).collect(),
        None => {
            let mut out = Vec::with_capacity(a_by_row.len() * b_by_col.len());
            for &i in a_by_row.keys() {
                for &j in b_by_col.keys() {
                    out.push((i, j));
                }
            }
            out
        }
    };

    let mut out: HashMap<(u64, u64), Vec<u8>> = HashMap::new();
    for (i, j) in candidates {
        let (Some(row), Some(col)) = (a_by_row.get(&i), b_by_col.get(&j)) else { continue };
        let mut acc: Option<Vec<u8>> = None;
        for (k, av) in row {
            if let Some(bv) = col.get(k) {
                acc = Some(combine_product(semiring, av, bv, acc));
            }
        }
        if let Some(z) = acc {
            out.insert((i, j), z);
        }
    }
    Ok(out)
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
    fn select_axb_prefers_dot_for_bitmap_operand() {
        let mut a = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::pinned(Sparsity::Bitmap)).unwrap();
        a.set_element(0, 0, 1i32).unwrap();
        a.wait().unwrap();
        let b = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        let c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        let sr = plus_times(T::Int32).unwrap();
        let resolved = descriptor_get(None, "test").unwrap().0;
        assert_eq!(select_axb(&resolved, &a, &b, &c, &sr), AxbAlgorithm::Dot);
    }

    #[test]
    fn mxm_computes_plus_times_product() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 2)]);
        let b = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 3), (1, 0, 4)]);
        let sr = plus_times(T::Int32).unwrap();
        let mut c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        mxm(&mut c, None, None, &sr, &a, &b, None).unwrap();
        let v: i32 = c.extract_element(0, 0).unwrap().unwrap();
        assert_eq!(v, 3 + 8);
        assert!(c.extract_element::<i32>(1, 0).unwrap().is_none());
    }

    #[test]
    fn min_plus_shortest_path_step() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 1, 3)]);
        let b = scalar_matrix(T::Int32, 2, 2, &[(1, 0, 4)]);
        let sr = crate::registry::min_plus(T::Int32).unwrap();
        let mut c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        mxm(&mut c, None, None, &sr, &a, &b, None).unwrap();
        let v: i32 = c.extract_element(0, 0).unwrap().unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn mxv_treats_column_vector_as_matrix() {
        let a = scalar_matrix(T::Int32, 2, 2, &[(0, 0, 1), (0, 1, 1), (1, 1, 1)]);
        let x = scalar_matrix(T::Int32, 2, 1, &[(0, 0, 5), (1, 0, 6)]);
        let sr = plus_times(T::Int32).unwrap();
        let mut y = Matrix::new(ElementType::builtin(T::Int32), 2, 1, SparsityControl::AUTO).unwrap();
        mxv(&mut y, None, None, &sr, &a, &x, None).unwrap();
        let v: i32 = y.extract_element(0, 0).unwrap().unwrap();
        assert_eq!(v, 5);
        let v: i32 = y.extract_element(1, 0).unwrap().unwrap();
        assert_eq!(v, 6);
    }

    #[test]
    fn mismatched_inner_dimension_is_rejected() {
        let a = Matrix::new(ElementType::builtin(T::Int32), 2, 3, SparsityControl::AUTO).unwrap();
        let b = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        let sr = plus_times(T::Int32).unwrap();
        let mut c = Matrix::new(ElementType::builtin(T::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        assert!(mxm(&mut c, None, None, &sr, &a, &b, None).is_err());
    }
}
