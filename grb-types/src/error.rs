use thiserror::Error;

/// Result alias used across the grb workspace.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that can occur while describing or casting between element types.
///
/// This is a small subset of the engine-wide `GrbError` (see `grb-core`):
/// it only covers the failures that can happen in this crate, which never
/// touches a matrix, a lock or an allocator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A raw type-code value did not match any built-in or registered user
    /// type.
    #[error("unknown type code {0}")]
    InvalidValue(u32),
    /// A cast was requested between two types with no defined conversion.
    #[error("no cast defined from {from} to {to}")]
    DomainMismatch {
        /// Name of the source type.
        from: &'static str,
        /// Name of the destination type.
        to: &'static str,
    },
}
