//! Sparse-matrix graph algebra engine: the matrix container, format
//! conversions, element-wise kernels, masked semiring matrix multiply,
//! tuple iteration, bulk build/extract, the pending queue, and the typed
//! operator/monoid/semiring registry a graph-algorithm driver dispatches
//! through.
//!
//! Re-exports `grb_types` and `grb_asm` at the crate root for downstream
//! convenience, so callers only need this one crate in a typical
//! `Cargo.toml`.

#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod matrix;
#[cfg(feature = "serde")]
pub mod persist;
pub mod registry;
pub mod sort;

pub use grb_asm;
pub use grb_types;

pub use buffer::Buffer;
pub use config::{global as global_config, GlobalConfig};
pub use context::Context;
pub use descriptor::{AxbMethod, Descriptor, MaskPolicy, OutputPolicy, TransposePolicy};
pub use error::{GrbError, GrbResult};
pub use matrix::{
    ewise_add, ewise_mult, mxm, mxv, reduce_to_scalar, reduce_to_vector, transpose, vxm, AxbAlgorithm, ColIterator,
    ExtractedTuples, Matrix, MatrixId, RowIterator, SeekResult, Sparsity, SparsityControl,
};
pub use registry::{BinaryOp, Monoid, Semiring, UnaryOp};
