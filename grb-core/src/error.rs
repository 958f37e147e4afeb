use thiserror::Error;

use crate::context::Context;

/// Result alias for the engine's public API.
pub type GrbResult<T> = Result<T, GrbError>;

/// The engine's closed status-code set, realized as an error enum
/// carrying its own formatted message rather than a bare code plus a
/// thread-local detail string.
///
/// `NoValue` is deliberately *not* a variant here: point-queries that
/// find nothing return `Ok(None)` — callers treat a missing entry as
/// data, not as an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrbError {
    /// A required object reference was null/absent.
    #[error("null pointer passed to {where_}")]
    NullPointer {
        /// Name of the operation that detected the fault.
        where_: &'static str,
    },
    /// An object was used before being initialized, or was corrupted.
    #[error("uninitialized object used in {where_}")]
    UninitializedObject {
        /// Name of the operation that detected the fault.
        where_: &'static str,
    },
    /// An object failed a structural/invariant check.
    #[error("invalid object in {where_}: {details}")]
    InvalidObject {
        /// Name of the operation that detected the fault.
        where_: &'static str,
        /// Human-readable detail.
        details: String,
    },
    /// A scalar argument had a value outside its legal domain.
    #[error("invalid value in {where_}: {details}")]
    InvalidValue {
        /// Name of the operation that detected the fault.
        where_: &'static str,
        /// Human-readable detail.
        details: String,
    },
    /// An index was outside `[0, GRB_INDEX_MAX]` or outside a matrix's
    /// declared dimensions.
    #[error("invalid index {index} in {where_}")]
    InvalidIndex {
        /// Name of the operation that detected the fault.
        where_: &'static str,
        /// The offending index.
        index: u64,
    },
    /// Two operands had incompatible element types for the requested
    /// operation (no cast defined).
    #[error("domain mismatch in {where_}: {details}")]
    DomainMismatch {
        /// Name of the operation that detected the fault.
        where_: &'static str,
        /// Human-readable detail.
        details: String,
    },
    /// Two operands had incompatible shapes for the requested operation.
    #[error("dimension mismatch in {where_}: {details}")]
    DimensionMismatch {
        /// Name of the operation that detected the fault.
        where_: &'static str,
        /// Human-readable detail.
        details: String,
    },
    /// The output matrix was required to be empty but wasn't.
    #[error("output not empty in {where_}")]
    OutputNotEmpty {
        /// Name of the operation that detected the fault.
        where_: &'static str,
    },
    /// A fixed-capacity buffer was too small for the result.
    #[error("insufficient space in {where_}")]
    InsufficientSpace {
        /// Name of the operation that detected the fault.
        where_: &'static str,
    },
    /// Allocation failed; any partially built temporary was freed and the
    /// target matrix left in its pre-call state.
    #[error("out of memory in {where_}")]
    OutOfMemory {
        /// Name of the operation that detected the fault.
        where_: &'static str,
    },
    /// A cooperative cancellation flag was observed at a task boundary.
    #[error("operation aborted by caller in {where_}")]
    AbortedByUser {
        /// Name of the operation that detected the fault.
        where_: &'static str,
    },
    /// A debug-assertion invariant was violated. Reserved for internal
    /// logic errors; in release builds these degrade to `OutOfMemory` at
    /// the call site that would otherwise panic.
    #[error("internal invariant violated in {where_}: {details}")]
    Panic {
        /// Name of the operation that detected the fault.
        where_: &'static str,
        /// Human-readable detail.
        details: String,
    },
}

impl GrbError {
    /// Attach the `where`/`details` pair from a `Context` to an
    /// `InvalidObject` error. Most call sites construct errors directly;
    /// this helper exists for the few internal paths that build up a
    /// `Context` before knowing whether the call will fail.
    pub fn invalid_object(ctx: &Context, details: impl Into<String>) -> GrbError {
        GrbError::InvalidObject {
            where_: ctx.where_fn_name,
            details: details.into(),
        }
    }
}
