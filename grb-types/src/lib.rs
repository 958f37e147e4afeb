//! Primitive element types, index bounds and scalar traits shared by the
//! grb sparse matrix engine.
//!
//! This crate has no notion of operators, matrices or kernels — it only
//! defines the closed catalog of built-in element types (§3 "Element type")
//! and the index/value vocabulary every other crate in the workspace builds
//! on.

#![cfg_attr(not(feature = "std"), no_std)]

mod element;
mod error;
mod index;
mod scalar;

pub use element::{ElementType, TypeCode, UserTypeId};
pub use error::{Error, Result};
pub use index::{GrbIndex, GRB_INDEX_MAX};
pub use scalar::GrbScalar;
