//! Bulk build/extract and single-element access.

use grb_types::{ElementType, GrbIndex, GrbScalar, GRB_INDEX_MAX};

use crate::error::{GrbError, GrbResult};
use crate::registry::BinaryOp;
use crate::sort::msort_2;

use super::format::conform;
use super::pending::PendingOp;
use super::{decode_scalar, encode_scalar, Matrix, Sparsity, SparsityControl};

/// The `(I, J, X)` triplet stream produced by `extractTuples`.
pub struct ExtractedTuples<T> {
    /// Row indices.
    pub i: Vec<GrbIndex>,
    /// Column indices.
    pub j: Vec<GrbIndex>,
    /// Values, typecast to `T` if the matrix's own type differs.
    pub x: Vec<T>,
}

impl Matrix {
    fn elem_size(&self) -> usize {
        self.ty.size()
    }

    fn outer_inner(&self, row: u64, col: u64) -> (u64, u64) {
        if self.is_csc {
            (col, row)
        } else {
            (row, col)
        }
    }

    fn row_col(&self, outer: u64, inner: u64) -> (u64, u64) {
        if self.is_csc {
            (inner, outer)
        } else {
            (outer, inner)
        }
    }

    fn bitmap_offset(&self, outer: u64, inner: u64) -> usize {
        (inner + outer * self.vlen) as usize
    }

    /// Value bytes stored at slot `p` in `I`/`X` (iso matrices share one
    /// scalar for every slot).
    pub(crate) fn value_at(&self, p: usize) -> &[u8] {
        let size = self.elem_size();
        if self.iso {
            &self.x.as_slice()[0..size]
        } else {
            &self.x.as_slice()[p * size..(p + 1) * size]
        }
    }

    /// Binary search `I[P[k]..P[k+1])` for `inner`, skipping zombies.
    fn find_in_slice(&self, k: usize, inner: u64) -> Option<usize> {
        let p = self.p.as_slice();
        let lo = p[k] as usize;
        let hi = p[k + 1] as usize;
        let inner_arr = &self.inner.as_slice()[lo..hi];
        let pos = inner_arr.binary_search(&inner).ok()?;
        let slot = lo + pos;
        if self.zombie.as_ref().is_some_and(|z| z.get(slot).unwrap_or(false)) {
            None
        } else {
            Some(slot)
        }
    }

    fn find_outer_slice(&self, outer: u64) -> Option<usize> {
        match self.format {
            Sparsity::Hypersparse => self.h.as_slice().binary_search(&outer).ok(),
            Sparsity::Sparse => {
                if outer < self.nvec as u64 {
                    Some(outer as usize)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn locate(&self, row: u64, col: u64) -> Option<usize> {
        let (outer, inner) = self.outer_inner(row, col);
        match self.format {
            Sparsity::Hypersparse | Sparsity::Sparse => {
                let k = self.find_outer_slice(outer)?;
                self.find_in_slice(k, inner)
            }
            Sparsity::Bitmap => {
                let off = self.bitmap_offset(outer, inner);
                self.bitmap.as_ref().and_then(|b| b.get(off)).filter(|v| *v).map(|_| off)
            }
            Sparsity::Full => Some(self.bitmap_offset(outer, inner)),
        }
    }

    /// `GrB_Matrix_extractElement`: look up `(row, col)`, typecasting to
    /// `T` if the matrix's stored type differs. `Ok(None)` means "not
    /// present" — no-data is not an error. Resolves any pending work
    /// first.
    pub fn extract_element<T: GrbScalar + Copy>(&mut self, row: GrbIndex, col: GrbIndex) -> GrbResult<Option<T>> {
        if row >= self.nrows() || col >= self.ncols() {
            return Err(GrbError::InvalidIndex {
                where_: "extract_element",
                index: row.max(col),
            });
        }
        if self.needs_wait() {
            self.wait()?;
        }
        let Some(p) = self.locate(row, col) else { return Ok(None) };
        let stored = self.value_at(p);
        let recast = match self.ty.code() {
            grb_types::Code::Builtin(from) if from == T::TYPE_CODE => stored.to_vec(),
            grb_types::Code::Builtin(from) => {
                let mut dst = vec![0u8; T::TYPE_CODE.size()];
                grb_asm::cast(T::TYPE_CODE, from, &mut dst, stored);
                dst
            }
            grb_types::Code::UserDefined(_) => stored.to_vec(),
        };
        Ok(Some(decode_scalar(&recast)))
    }

    /// Opaque-byte form of [`Matrix::extract_element`]: no typecast, `out`
    /// must be exactly this matrix's element size. Returns `true` if an
    /// entry was found and copied.
    pub fn extract_element_opaque(&mut self, row: GrbIndex, col: GrbIndex, out: &mut [u8]) -> GrbResult<bool> {
        if row >= self.nrows() || col >= self.ncols() {
            return Err(GrbError::InvalidIndex {
                where_: "extract_element",
                index: row.max(col),
            });
        }
        if self.needs_wait() {
            self.wait()?;
        }
        match self.locate(row, col) {
            Some(p) => {
                out.copy_from_slice(self.value_at(p));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `GrB_Matrix_setElement`: enqueue `(row, col, value)` onto the
    /// pending queue rather than mutating storage directly. Later writes
    /// to the same coordinate overwrite earlier ones.
    pub fn set_element<T: GrbScalar>(&mut self, row: GrbIndex, col: GrbIndex, value: T) -> GrbResult<()> {
        let native = encode_scalar(value);
        let bytes = match self.ty.code() {
            grb_types::Code::Builtin(to) if to == T::TYPE_CODE => native,
            grb_types::Code::Builtin(to) => {
                let mut dst = vec![0u8; to.size()];
                grb_asm::cast(to, T::TYPE_CODE, &mut dst, &native);
                dst
            }
            grb_types::Code::UserDefined(_) => native,
        };
        self.set_element_opaque(row, col, bytes)
    }

    /// Opaque-byte form of [`Matrix::set_element`]. `bytes` must already
    /// be this matrix's element-type encoding.
    pub fn set_element_opaque(&mut self, row: GrbIndex, col: GrbIndex, bytes: Vec<u8>) -> GrbResult<()> {
        if row >= self.nrows() || col >= self.ncols() {
            return Err(GrbError::InvalidIndex {
                where_: "set_element",
                index: row.max(col),
            });
        }
        self.iso = false;
        self.pending.push(row, col, bytes, PendingOp::Overwrite);
        Ok(())
    }

    /// `GrB_Matrix_build`: construct from `(I, J, X)` triplets, reducing
    /// duplicate coordinates with `dup` in input order (associativity of
    /// `dup` is not assumed).
    pub fn build<T: GrbScalar>(
        ty: ElementType,
        nrows: GrbIndex,
        ncols: GrbIndex,
        i: &[GrbIndex],
        j: &[GrbIndex],
        x: &[T],
        dup: Option<&BinaryOp>,
    ) -> GrbResult<Matrix> {
        if i.len() != j.len() || (x.len() != 1 && x.len() != i.len()) {
            return Err(GrbError::DimensionMismatch {
                where_: "Matrix::build",
                details: "I, J and X must have matching lengths (X may be length 1 for a scalar build)".into(),
            });
        }
        let bytes: Vec<u8> = x.iter().flat_map(|v| encode_scalar(*v)).collect();
        Matrix::build_opaque(ty, nrows, ncols, i, j, &bytes, std::mem::size_of::<T>(), dup)
    }

    /// Opaque-byte form of [`Matrix::build`].
    pub fn build_opaque(
        ty: ElementType,
        nrows: GrbIndex,
        ncols: GrbIndex,
        i: &[GrbIndex],
        j: &[GrbIndex],
        x: &[u8],
        elem_size: usize,
        dup: Option<&BinaryOp>,
    ) -> GrbResult<Matrix> {
        for &idx in i.iter().chain(j.iter()) {
            if idx > GRB_INDEX_MAX {
                return Err(GrbError::InvalidIndex {
                    where_: "Matrix::build",
                    index: idx,
                });
            }
        }
        let n = i.len();
        let scalar_build = x.len() == elem_size && n != 1;
        let cfg = crate::config::global();
        let is_csc = matches!(cfg.default_orientation, crate::config::DefaultOrientation::ByCol);
        let mut template = Matrix::new(ty, nrows, ncols, SparsityControl::AUTO)?;
        template.is_csc = is_csc;

        if scalar_build {
            let entries: Vec<(u64, u64, Vec<u8>)> = (0..n).map(|k| (i[k], j[k], x.to_vec())).collect();
            let mut m = rebuild_from_entries(&template, entries)?;
            m.set_iso_scalar(x.to_vec());
            return Ok(m);
        }

        let mut entries: Vec<(u64, u64, Vec<u8>)> = (0..n).map(|k| (i[k], j[k], x[k * elem_size..(k + 1) * elem_size].to_vec())).collect();

        let (outer_of, inner_of): (fn(&Matrix, u64, u64) -> u64, fn(&Matrix, u64, u64) -> u64) = (
            |m: &Matrix, r, c| m.outer_inner(r, c).0,
            |m: &Matrix, r, c| m.outer_inner(r, c).1,
        );
        let mut keys: Vec<(i64, i64)> = entries
            .iter()
            .map(|(r, c, _)| (outer_of(&template, *r, *c) as i64, inner_of(&template, *r, *c) as i64))
            .collect();
        msort_2(&mut keys, &mut entries);

        let mut reduced = Vec::with_capacity(entries.len());
        let mut idx = 0;
        while idx < entries.len() {
            let mut end = idx + 1;
            while end < entries.len() && keys[end] == keys[idx] {
                end += 1;
            }
            let mut acc = entries[idx].2.clone();
            if let Some(op) = dup {
                for (_, _, xv) in &entries[idx + 1..end] {
                    let mut out = vec![0u8; op.z_type.size()];
                    op.apply(&acc, xv, &mut out);
                    acc = out;
                }
            } else if end - idx > 1 {
                acc = entries[end - 1].2.clone();
            }
            reduced.push((entries[idx].0, entries[idx].1, acc));
            idx = end;
        }

        rebuild_from_entries(&template, reduced)
    }

    /// `GrB_Matrix_extractTuples`: dump all present entries in `(I, J, X)`
    /// form, typecasting to `T`. Resolves pending work first.
    pub fn extract_tuples<T: GrbScalar + Copy>(&mut self) -> GrbResult<ExtractedTuples<T>> {
        if self.needs_wait() {
            self.wait()?;
        }
        let triplets = dump_tuples(self)?;
        let mut i = Vec::with_capacity(triplets.len());
        let mut j = Vec::with_capacity(triplets.len());
        let mut x = Vec::with_capacity(triplets.len());
        for (r, c, bytes) in triplets {
            i.push(r);
            j.push(c);
            x.push(decode_scalar(&bytes));
        }
        Ok(ExtractedTuples { i, j, x })
    }
}

/// Dump every present `(row, col, value_bytes)` entry, skipping zombies,
/// in whatever order the current format naturally produces (row-major or
/// column-major per `is_csc`). Used by `wait` and `extractTuples`.
pub(crate) fn dump_tuples(m: &Matrix) -> GrbResult<Vec<(u64, u64, Vec<u8>)>> {
    let size = m.elem_size();
    let mut out = Vec::with_capacity(m.nvals().max(m.inner.len()));
    match m.format {
        Sparsity::Hypersparse | Sparsity::Sparse => {
            let p = m.p.as_slice();
            for k in 0..m.nvec {
                let outer = match m.format {
                    Sparsity::Hypersparse => m.h.as_slice()[k],
                    _ => k as u64,
                };
                let lo = p[k] as usize;
                let hi = p[k + 1] as usize;
                for slot in lo..hi {
                    if m.zombie.as_ref().is_some_and(|z| z.get(slot).unwrap_or(false)) {
                        continue;
                    }
                    let inner = m.inner.as_slice()[slot];
                    let (row, col) = m.row_col(outer, inner);
                    out.push((row, col, m.value_at(slot).to_vec()));
                }
            }
        }
        Sparsity::Bitmap => {
            let bm = m.bitmap.as_ref().expect("bitmap format always carries a bitmap");
            for outer in 0..m.vdim {
                for inner in 0..m.vlen {
                    let off = m.bitmap_offset(outer, inner);
                    if bm.get(off).unwrap_or(false) {
                        let (row, col) = m.row_col(outer, inner);
                        out.push((row, col, value_bytes_at(m, off, size)));
                    }
                }
            }
        }
        Sparsity::Full => {
            for outer in 0..m.vdim {
                for inner in 0..m.vlen {
                    let off = m.bitmap_offset(outer, inner);
                    let (row, col) = m.row_col(outer, inner);
                    out.push((row, col, value_bytes_at(m, off, size)));
                }
            }
        }
    }
    Ok(out)
}

fn value_bytes_at(m: &Matrix, offset: usize, size: usize) -> Vec<u8> {
    if m.iso {
        m.x.as_slice()[0..size].to_vec()
    } else {
        m.x.as_slice()[offset * size..(offset + 1) * size].to_vec()
    }
}

/// Rebuild a matrix with `template`'s type/shape/orientation/thresholds
/// from a fresh `(row, col, value_bytes)` entry list (assumed already
/// duplicate-free). Chooses the initial sparsity format via `conform`.
pub(crate) fn rebuild_from_entries(template: &Matrix, mut entries: Vec<(u64, u64, Vec<u8>)>) -> GrbResult<Matrix> {
    let size = template.elem_size();
    let is_csc = template.is_csc;
    let (outer_of, inner_of) = (
        |is_csc: bool, r: u64, c: u64| if is_csc { c } else { r },
        |is_csc: bool, r: u64, c: u64| if is_csc { r } else { c },
    );

    let mut keys: Vec<(i64, i64)> = entries.iter().map(|(r, c, _)| (outer_of(is_csc, *r, *c) as i64, inner_of(is_csc, *r, *c) as i64)).collect();
    {
        let mut payload: Vec<usize> = (0..entries.len()).collect();
        msort_2(&mut keys, &mut payload);
        let reordered: Vec<_> = payload.into_iter().map(|k| entries[k].clone()).collect();
        entries = reordered;
    }

    let vdim = template.vdim;
    let vlen = template.vlen;
    let nnz = entries.len();

    let mut nonempty_outers: Vec<u64> = Vec::new();
    let mut p: Vec<i64> = Vec::new();
    let mut inner: Vec<u64> = Vec::with_capacity(nnz);
    let mut x_bytes: Vec<u8> = Vec::with_capacity(nnz * size);

    p.push(0);
    let mut cursor = 0usize;
    for outer in 0..vdim {
        let start = cursor;
        while cursor < nnz && keys[cursor].0 == outer as i64 {
            let (_, _, bytes) = &entries[cursor];
            inner.push(keys[cursor].1 as u64);
            x_bytes.extend_from_slice(bytes);
            cursor += 1;
        }
        if cursor > start {
            nonempty_outers.push(outer);
        }
        p.push(cursor as i64);
    }

    let mut m = Matrix::new(template.ty.clone(), template.nrows(), template.ncols(), template.sparsity_control)?;
    m.is_csc = is_csc;
    m.hyper_switch = template.hyper_switch;
    m.bitmap_switch = template.bitmap_switch;
    m.vlen = vlen;
    m.vdim = vdim;
    m.nvec = vdim as usize;
    m.plen = p.len();
    m.p = crate::buffer::Buffer::owned(p);
    m.h = crate::buffer::Buffer::owned(nonempty_outers);
    m.format = Sparsity::Sparse;
    m.inner = crate::buffer::Buffer::owned(inner);
    m.x = crate::buffer::Buffer::owned(x_bytes);
    m.bitmap = None;
    m.zombie = None;
    m.nvals = nnz;
    m.nzombies = 0;
    m.jumbled = false;

    conform(&mut m)?;
    Ok(m)
}
