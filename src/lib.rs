//! Budget-constrained allocation of agricultural mitigation practices.
//!
//! Rust callers use the re-exported `agroalloc_core` API. With the `python`
//! feature this crate also builds the `agroalloc._lib` extension module.

pub use agroalloc_core::*;

#[cfg(feature = "python")]
mod python;
