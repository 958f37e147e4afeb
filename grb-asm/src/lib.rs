//! Opcode catalog, built-in monoid table and cast factory.
//!
//! Rather than macro-expanding one function per `(opcode, type)` pair,
//! the opcode set is a closed Rust enum and the per-entry behavior is
//! dispatched generically at the call site (`grb-core::registry`)
//! through a `Scalar` pivot value.

#![cfg_attr(not(feature = "std"), no_std)]

mod cast;
mod eval;
mod monoid_table;
mod opcode;

pub use cast::{cast, Scalar};
pub use eval::{apply_binary, apply_positional, apply_unary};
pub use monoid_table::{canonical_monoid, IdentityKind};
pub use opcode::{BinaryOpcode, UnaryOpcode};
