//! The matrix container: a single structure representing any of the four
//! sparsity formats, with pending-update and zombie bookkeeping.
//!
//! Submodules each own one concern:
//! `format` (conversions), `pending` (the pending queue and `wait`),
//! `build` (bulk build/extract and single-element access), `ewise`
//! (`eWiseAdd`/`eWiseMult`), `matmul` (`mxm`/`vxm`/`mxv`), `iterator`
//! (row/column tuple iteration), `transpose`, `reduce`.

mod build;
mod ewise;
mod format;
mod iterator;
mod matmul;
mod pending;
mod reduce;
mod transpose;

pub use build::ExtractedTuples;
pub(crate) use build::{dump_tuples, rebuild_from_entries};
pub use ewise::{ewise_add, ewise_mult};
pub use iterator::{ColIterator, RowIterator, SeekResult};
pub use matmul::{mxm, mxv, select_axb, vxm, AxbAlgorithm};
pub use pending::PendingOp;
pub use reduce::{reduce_to_scalar, reduce_to_vector};
pub use transpose::transpose;

use std::sync::atomic::{AtomicU64, Ordering};

use bit_vec::BitVec;
use grb_types::{Code, ElementType, GrbIndex, GrbScalar, TypeCode, GRB_INDEX_MAX};

use crate::buffer::Buffer;
use crate::error::{GrbError, GrbResult};
use self::pending::PendingQueue;

/// Which of the four sparsity formats a matrix currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sparsity {
    /// Sparse, additionally storing only the non-empty outer indices.
    Hypersparse,
    /// CSC/CSR-style pointer array over all outer slices.
    Sparse,
    /// Dense presence bitmap plus dense values.
    Bitmap,
    /// Every `(i,j)` slot is present; no index structure at all.
    Full,
}

/// Which formats a matrix is permitted to `conform` to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparsityControl(u8);

impl SparsityControl {
    const HYPERSPARSE: u8 = 1 << 0;
    const SPARSE: u8 = 1 << 1;
    const BITMAP: u8 = 1 << 2;
    const FULL: u8 = 1 << 3;

    /// All four formats are allowed; the engine picks by density
    /// threshold. The default for a freshly created matrix.
    pub const AUTO: SparsityControl = SparsityControl(Self::HYPERSPARSE | Self::SPARSE | Self::BITMAP | Self::FULL);

    /// Only the given format is ever used; `conform` becomes a no-op once
    /// reached and an explicit `set_format` is required to leave it.
    pub fn pinned(format: Sparsity) -> SparsityControl {
        SparsityControl(Self::bit(format))
    }

    fn bit(format: Sparsity) -> u8 {
        match format {
            Sparsity::Hypersparse => Self::HYPERSPARSE,
            Sparsity::Sparse => Self::SPARSE,
            Sparsity::Bitmap => Self::BITMAP,
            Sparsity::Full => Self::FULL,
        }
    }

    /// `true` if `format` is among the formats this control permits.
    pub fn allows(self, format: Sparsity) -> bool {
        self.0 & Self::bit(format) != 0
    }
}

impl Default for SparsityControl {
    fn default() -> SparsityControl {
        SparsityControl::AUTO
    }
}

/// Identity assigned to a matrix at `matrix_new` time, monotonically
/// increasing process-wide. Used to fix lock-acquisition order across
/// matrices: input ids ascending, then output, to prevent deadlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display("#{_0}")]
pub struct MatrixId(u64);

static NEXT_MATRIX_ID: AtomicU64 = AtomicU64::new(1);

fn next_matrix_id() -> MatrixId {
    MatrixId(NEXT_MATRIX_ID.fetch_add(1, Ordering::Relaxed))
}

/// The matrix container: `vlen`/`vdim`, `is_csc`, `nvec`/`plen`,
/// `P`/`H`/`I`/`B`/`X`, `iso`, `nvals`, `nzombies`, `Pending`, `jumbled`,
/// and the format-transition thresholds all live on one struct.
#[derive(Clone)]
pub struct Matrix {
    pub(crate) id: MatrixId,
    pub(crate) ty: ElementType,
    pub(crate) vlen: u64,
    pub(crate) vdim: u64,
    pub(crate) is_csc: bool,
    pub(crate) format: Sparsity,

    pub(crate) nvec: usize,
    pub(crate) plen: usize,
    pub(crate) p: Buffer<i64>,
    pub(crate) h: Buffer<u64>,
    pub(crate) inner: Buffer<u64>,
    pub(crate) bitmap: Option<BitVec>,
    pub(crate) zombie: Option<BitVec>,
    pub(crate) x: Buffer<u8>,
    pub(crate) iso: bool,

    pub(crate) nvals: usize,
    pub(crate) nzombies: usize,
    pub(crate) pending: PendingQueue,
    pub(crate) jumbled: bool,

    pub(crate) hyper_switch: f64,
    pub(crate) bitmap_switch: f64,
    pub(crate) sparsity_control: SparsityControl,
}

impl Matrix {
    /// `GrB_Matrix_new`: allocate an empty `vlen x vdim` matrix of type
    /// `ty`. `P`/`H` are only allocated once a conversion actually needs
    /// them: if the hint forces hyper/sparse they're allocated up front,
    /// otherwise they're left empty.
    #[tracing::instrument(level = "debug", skip(ty))]
    pub fn new(ty: ElementType, nrows: GrbIndex, ncols: GrbIndex, sparsity_hint: SparsityControl) -> GrbResult<Matrix> {
        if nrows > GRB_INDEX_MAX + 1 || ncols > GRB_INDEX_MAX + 1 {
            return Err(GrbError::InvalidIndex {
                where_: "Matrix::new",
                index: nrows.max(ncols),
            });
        }
        let cfg = crate::config::global();
        let is_csc = matches!(cfg.default_orientation, crate::config::DefaultOrientation::ByCol);
        let (vlen, vdim) = if is_csc { (nrows, ncols) } else { (ncols, nrows) };

        let starts_hyper = sparsity_hint.allows(Sparsity::Hypersparse) && !sparsity_hint.allows(Sparsity::Full) && !sparsity_hint.allows(Sparsity::Bitmap);
        let format = if starts_hyper {
            Sparsity::Hypersparse
        } else if sparsity_hint.allows(Sparsity::Sparse) {
            Sparsity::Sparse
        } else if sparsity_hint.allows(Sparsity::Bitmap) {
            Sparsity::Bitmap
        } else {
            Sparsity::Full
        };

        let mut m = Matrix {
            id: next_matrix_id(),
            ty,
            vlen,
            vdim,
            is_csc,
            format,
            nvec: 0,
            plen: 0,
            p: Buffer::new(),
            h: Buffer::new(),
            inner: Buffer::new(),
            bitmap: None,
            zombie: None,
            x: Buffer::new(),
            iso: false,
            nvals: 0,
            nzombies: 0,
            pending: PendingQueue::new(),
            jumbled: false,
            hyper_switch: cfg.hyper_switch,
            bitmap_switch: cfg.bitmap_switch,
            sparsity_control: sparsity_hint,
        };
        match format {
            Sparsity::Hypersparse | Sparsity::Sparse => {
                m.p = Buffer::owned(vec![0i64]);
                m.plen = 1;
            }
            Sparsity::Bitmap => {
                m.bitmap = Some(BitVec::from_elem((vlen * vdim) as usize, false));
            }
            Sparsity::Full => {}
        }
        Ok(m)
    }

    /// This matrix's process-wide identity, used by the caller to fix
    /// lock-acquisition order across multiple matrices.
    pub fn id(&self) -> MatrixId {
        self.id
    }

    /// The element type every entry is stored as.
    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    /// Number of rows, respecting orientation.
    pub fn nrows(&self) -> GrbIndex {
        if self.is_csc {
            self.vlen
        } else {
            self.vdim
        }
    }

    /// Number of columns, respecting orientation.
    pub fn ncols(&self) -> GrbIndex {
        if self.is_csc {
            self.vdim
        } else {
            self.vlen
        }
    }

    /// Current sparsity format.
    pub fn format(&self) -> Sparsity {
        self.format
    }

    /// `true` if entries are stored column-major (CSC-style outer = column).
    pub fn is_csc(&self) -> bool {
        self.is_csc
    }

    /// Number of present entries: authoritative for bitmap format (where
    /// presence isn't otherwise counted); for every other format this is
    /// derived and kept in sync by every mutating operation.
    pub fn nvals(&self) -> usize {
        self.nvals
    }

    /// `true` if every entry shares one stored scalar.
    pub fn is_iso(&self) -> bool {
        self.iso
    }

    /// `GrB_Matrix_clear`: remove all entries, keep shape/type/thresholds.
    pub fn clear(&mut self) {
        let hint = self.sparsity_control;
        let ty = self.ty.clone();
        let (nrows, ncols) = (self.nrows(), self.ncols());
        let hyper_switch = self.hyper_switch;
        let bitmap_switch = self.bitmap_switch;
        let is_csc = self.is_csc;
        *self = Matrix::new(ty, nrows, ncols, hint).expect("clear cannot fail: dimensions already validated");
        self.is_csc = is_csc;
        self.hyper_switch = hyper_switch;
        self.bitmap_switch = bitmap_switch;
    }

    /// `GrB_Matrix_dup`: deep copy. The result is never shallow.
    pub fn duplicate(&self) -> Matrix {
        let mut m = self.clone();
        m.id = next_matrix_id();
        m.p = Buffer::owned(self.p.as_slice().to_vec());
        m.h = Buffer::owned(self.h.as_slice().to_vec());
        m.inner = Buffer::owned(self.inner.as_slice().to_vec());
        m.x = Buffer::owned(self.x.as_slice().to_vec());
        m
    }

    /// `GrB_Matrix_resize`-style reshape used internally by `build`/
    /// `transpose`; public algorithms never need to change `vlen`/`vdim`
    /// after creation outside those paths.
    pub(crate) fn set_shape(&mut self, vlen: u64, vdim: u64) {
        self.vlen = vlen;
        self.vdim = vdim;
    }

    /// Move `src`'s non-shallow buffers into `self`, typecasting `X` if
    /// `new_type` differs from `src`'s type; shallow pieces are copied
    /// rather than moved. Leaves `src` empty. Does not touch `self`'s
    /// `sparsity_control` or hyper/bitmap thresholds.
    pub fn transplant(&mut self, mut src: Matrix, new_type: ElementType) -> GrbResult<()> {
        let keep_control = self.sparsity_control;
        let keep_hyper = self.hyper_switch;
        let keep_bitmap = self.bitmap_switch;

        let x_bytes = src.x.take_owned();
        let recast = if new_type.code() == src.ty.code() {
            x_bytes
        } else {
            cast_buffer(&src.ty, &new_type, &x_bytes)?
        };

        self.id = next_matrix_id();
        self.ty = new_type;
        self.vlen = src.vlen;
        self.vdim = src.vdim;
        self.is_csc = src.is_csc;
        self.format = src.format;
        self.nvec = src.nvec;
        self.plen = src.plen;
        self.p = Buffer::owned(src.p.take_owned());
        self.h = Buffer::owned(src.h.take_owned());
        self.inner = Buffer::owned(src.inner.take_owned());
        self.bitmap = src.bitmap.take();
        self.zombie = src.zombie.take();
        self.x = Buffer::owned(recast);
        self.iso = src.iso;
        self.nvals = src.nvals;
        self.nzombies = src.nzombies;
        self.pending = std::mem::replace(&mut src.pending, PendingQueue::new());
        self.jumbled = src.jumbled;

        self.sparsity_control = keep_control;
        self.hyper_switch = keep_hyper;
        self.bitmap_switch = keep_bitmap;

        src.format = Sparsity::Full;
        src.vlen = 0;
        src.vdim = 0;
        Ok(())
    }

    /// Mark `self` as an iso matrix whose single stored scalar is `value`
    /// (`value` must already be `self.ty`-sized bytes).
    pub(crate) fn set_iso_scalar(&mut self, value: Vec<u8>) {
        debug_assert_eq!(value.len(), self.ty.size());
        self.x = Buffer::owned(value);
        self.iso = true;
    }

    /// Read the iso scalar, if this matrix is iso.
    pub(crate) fn iso_scalar(&self) -> Option<&[u8]> {
        self.iso.then(|| self.x.as_slice())
    }
}

pub(crate) fn cast_buffer(from: &ElementType, to: &ElementType, src: &[u8]) -> GrbResult<Vec<u8>> {
    match (from.code(), to.code()) {
        (a, b) if a == b => Ok(src.to_vec()),
        (Code::Builtin(fc), Code::Builtin(tc)) => {
            let n = src.len() / from.size();
            let mut out = vec![0u8; n * to.size()];
            for k in 0..n {
                grb_asm::cast(
                    tc,
                    fc,
                    &mut out[k * to.size()..(k + 1) * to.size()],
                    &src[k * from.size()..(k + 1) * from.size()],
                );
            }
            Ok(out)
        }
        (Code::UserDefined(a), Code::UserDefined(b)) if a == b || from.size() == to.size() => Ok(src.to_vec()),
        _ => Err(GrbError::DomainMismatch {
            where_: "cast_buffer",
            details: format!("no cast defined from {} to {}", from.name(), to.name()),
        }),
    }
}

/// Encode a single `GrbScalar` value into its native byte representation.
pub(crate) fn encode_scalar<T: GrbScalar>(value: T) -> Vec<u8> {
    let mut buf = vec![0u8; std::mem::size_of::<T>()];
    let src = unsafe { std::slice::from_raw_parts(&value as *const T as *const u8, std::mem::size_of::<T>()) };
    buf.copy_from_slice(src);
    buf
}

/// Decode a native byte representation back into a `GrbScalar` value.
pub(crate) fn decode_scalar<T: GrbScalar + Copy>(bytes: &[u8]) -> T {
    debug_assert_eq!(bytes.len(), std::mem::size_of::<T>());
    unsafe { std::ptr::read_unaligned(bytes.as_ptr() as *const T) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_matrix_is_empty() {
        let m = Matrix::new(ElementType::builtin(TypeCode::Fp64), 3, 3, SparsityControl::AUTO).unwrap();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.nvals(), 0);
    }

    #[test]
    fn zero_dimension_matrix_is_legal() {
        let m = Matrix::new(ElementType::builtin(TypeCode::Bool), 0, 5, SparsityControl::AUTO).unwrap();
        assert_eq!(m.nrows(), 0);
        assert_eq!(m.nvals(), 0);
    }

    #[test]
    fn oversized_dimension_is_rejected() {
        let err = Matrix::new(ElementType::builtin(TypeCode::Bool), GRB_INDEX_MAX + 2, 1, SparsityControl::AUTO);
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_is_never_shallow() {
        let m = Matrix::new(ElementType::builtin(TypeCode::Int32), 4, 4, SparsityControl::AUTO).unwrap();
        let d = m.duplicate();
        assert!(!d.p.is_shallow());
        assert!(!d.x.is_shallow());
    }
}
