/// Row/column index used throughout the engine.
///
/// Matrices are addressed by `(i, j)` pairs of `GrbIndex`; both inner and
/// outer indices share this type.
pub type GrbIndex = u64;

/// Largest index a matrix dimension or a built triplet may use.
///
/// Mirrors the source's `GrB_INDEX_MAX = 2^60 - 1`. Building a matrix with
/// any index at or above this value returns `InvalidIndex`.
pub const GRB_INDEX_MAX: GrbIndex = (1u64 << 60) - 1;

/// `true` if `index` is within `[0, GRB_INDEX_MAX]`.
#[inline]
pub const fn index_in_bounds(index: GrbIndex) -> bool {
    index <= GRB_INDEX_MAX
}
