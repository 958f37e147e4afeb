//! Sparsity-format conversion ("conform").
//!
//! Every mutating path that changes `nvals` (build, wait, eWise, mxm, ...)
//! ends by calling [`conform`], which re-derives the matrix's ideal format
//! from its current density and `sparsity_control`, and rebuilds storage
//! into it if that differs from the current format. Converting is done by
//! dumping to `(row, col, value)` triplets and re-packing rather than
//! patching the existing arrays in place — simpler to get right, at the
//! cost of an O(nvals) copy on every format transition.

use bit_vec::BitVec;

use crate::buffer::Buffer;
use crate::error::GrbResult;
use crate::sort::msort_2;

use super::build::dump_tuples;
use super::{Matrix, Sparsity};

/// Re-derive the ideal sparsity format for `m` and rebuild into it if it
/// differs from the current one.
pub(crate) fn conform(m: &mut Matrix) -> GrbResult<()> {
    let triplets = dump_tuples(m)?;
    let target = choose_format(m, &triplets);
    if target != m.format {
        crate::config::burble_print(&format!(
            "conform: matrix {:?} {} -> {:?} ({} entries)",
            m.id(),
            format_name(m.format),
            target,
            triplets.len()
        ));
    }
    rebuild_into(m, target, triplets);
    Ok(())
}

fn format_name(f: Sparsity) -> &'static str {
    match f {
        Sparsity::Hypersparse => "hypersparse",
        Sparsity::Sparse => "sparse",
        Sparsity::Bitmap => "bitmap",
        Sparsity::Full => "full",
    }
}

fn choose_format(m: &Matrix, triplets: &[(u64, u64, Vec<u8>)]) -> Sparsity {
    let control = m.sparsity_control;
    let total_slots = (m.vlen as u128) * (m.vdim as u128);
    let nnz = triplets.len() as u128;
    let density = if total_slots > 0 { nnz as f64 / total_slots as f64 } else { 0.0 };
    let fully_dense = total_slots > 0 && nnz == total_slots;
    let nonempty = nonempty_outer_count(m, triplets);
    let hyper_worthwhile = m.vdim > 0 && (nonempty as f64) < m.hyper_switch * (m.vdim as f64);

    let preference: [Sparsity; 4] = if density > m.bitmap_switch {
        if fully_dense {
            [Sparsity::Full, Sparsity::Bitmap, Sparsity::Sparse, Sparsity::Hypersparse]
        } else {
            [Sparsity::Bitmap, Sparsity::Full, Sparsity::Sparse, Sparsity::Hypersparse]
        }
    } else if hyper_worthwhile {
        [Sparsity::Hypersparse, Sparsity::Sparse, Sparsity::Bitmap, Sparsity::Full]
    } else {
        [Sparsity::Sparse, Sparsity::Hypersparse, Sparsity::Bitmap, Sparsity::Full]
    };

    preference.into_iter().find(|f| control.allows(*f)).unwrap_or(m.format)
}

fn nonempty_outer_count(m: &Matrix, triplets: &[(u64, u64, Vec<u8>)]) -> usize {
    use std::collections::HashSet;
    let mut seen: HashSet<u64> = HashSet::new();
    for (r, c, _) in triplets {
        seen.insert(if m.is_csc { *c } else { *r });
    }
    seen.len()
}

fn rebuild_into(m: &mut Matrix, target: Sparsity, mut triplets: Vec<(u64, u64, Vec<u8>)>) {
    let size = m.ty.size();
    let is_csc = m.is_csc;
    let vlen = m.vlen;
    let vdim = m.vdim;

    match target {
        Sparsity::Full | Sparsity::Bitmap => {
            let total = (vlen as usize) * (vdim as usize);
            let mut x = vec![0u8; total * size];
            let mut bitmap = BitVec::from_elem(total, false);
            for (r, c, bytes) in &triplets {
                let (outer, inner) = if is_csc { (*c, *r) } else { (*r, *c) };
                let off = (inner + outer * vlen) as usize;
                x[off * size..(off + 1) * size].copy_from_slice(bytes);
                bitmap.set(off, true);
            }
            m.nvec = 0;
            m.plen = 0;
            m.p = Buffer::new();
            m.h = Buffer::new();
            m.inner = Buffer::new();
            m.x = Buffer::owned(x);
            m.bitmap = matches!(target, Sparsity::Bitmap).then_some(bitmap);
            m.zombie = None;
            m.format = target;
        }
        Sparsity::Sparse => {
            let mut keys: Vec<(i64, i64)> = triplets
                .iter()
                .map(|(r, c, _)| {
                    let (outer, inner) = if is_csc { (*c, *r) } else { (*r, *c) };
                    (outer as i64, inner as i64)
                })
                .collect();
            msort_2(&mut keys, &mut triplets);

            let nnz = triplets.len();
            let mut p: Vec<i64> = Vec::with_capacity(vdim as usize + 1);
            let mut inner: Vec<u64> = Vec::with_capacity(nnz);
            let mut x_bytes: Vec<u8> = Vec::with_capacity(nnz * size);
            p.push(0);
            let mut cursor = 0usize;
            for outer in 0..vdim {
                while cursor < nnz && keys[cursor].0 as u64 == outer {
                    inner.push(keys[cursor].1 as u64);
                    x_bytes.extend_from_slice(&triplets[cursor].2);
                    cursor += 1;
                }
                p.push(cursor as i64);
            }
            m.nvec = vdim as usize;
            m.plen = p.len();
            m.p = Buffer::owned(p);
            m.h = Buffer::new();
            m.inner = Buffer::owned(inner);
            m.x = Buffer::owned(x_bytes);
            m.bitmap = None;
            m.zombie = None;
            m.format = target;
        }
        Sparsity::Hypersparse => {
            let mut keys: Vec<(i64, i64)> = triplets
                .iter()
                .map(|(r, c, _)| {
                    let (outer, inner) = if is_csc { (*c, *r) } else { (*r, *c) };
                    (outer as i64, inner as i64)
                })
                .collect();
            msort_2(&mut keys, &mut triplets);

            let nnz = triplets.len();
            let mut p: Vec<i64> = vec![0];
            let mut h: Vec<u64> = Vec::new();
            let mut inner: Vec<u64> = Vec::with_capacity(nnz);
            let mut x_bytes: Vec<u8> = Vec::with_capacity(nnz * size);
            let mut cursor = 0usize;
            while cursor < nnz {
                let outer = keys[cursor].0 as u64;
                while cursor < nnz && keys[cursor].0 as u64 == outer {
                    inner.push(keys[cursor].1 as u64);
                    x_bytes.extend_from_slice(&triplets[cursor].2);
                    cursor += 1;
                }
                h.push(outer);
                p.push(cursor as i64);
            }
            m.nvec = h.len();
            m.plen = p.len();
            m.p = Buffer::owned(p);
            m.h = Buffer::owned(h);
            m.inner = Buffer::owned(inner);
            m.x = Buffer::owned(x_bytes);
            m.bitmap = None;
            m.zombie = None;
            m.format = target;
        }
    }
    m.nvals = match target {
        Sparsity::Full => (vlen as usize) * (vdim as usize),
        Sparsity::Bitmap => m.bitmap.as_ref().map(|b| b.iter().filter(|v| *v).count()).unwrap_or(0),
        Sparsity::Sparse | Sparsity::Hypersparse => m.inner.len(),
    };
    m.iso = false;
}

#[cfg(test)]
mod tests {
    use grb_types::{ElementType, TypeCode};

    use super::super::{Matrix, SparsityControl};
    use super::*;

    #[test]
    fn dense_matrix_conforms_to_full() {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        for r in 0..2u64 {
            for c in 0..2u64 {
                m.set_element(r, c, 7i32).unwrap();
            }
        }
        m.wait().unwrap();
        assert_eq!(m.format(), Sparsity::Full);
        assert_eq!(m.nvals(), 4);
    }

    #[test]
    fn sparse_matrix_with_pinned_control_stays_sparse() {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 100, 100, SparsityControl::pinned(Sparsity::Sparse)).unwrap();
        m.set_element(0, 0, 1i32).unwrap();
        m.wait().unwrap();
        assert_eq!(m.format(), Sparsity::Sparse);
    }

    #[test]
    fn very_sparse_wide_matrix_conforms_to_hypersparse() {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 100_000, 100_000, SparsityControl::AUTO).unwrap();
        m.set_element(5, 5, 1i32).unwrap();
        m.wait().unwrap();
        assert_eq!(m.format(), Sparsity::Hypersparse);
    }
}
