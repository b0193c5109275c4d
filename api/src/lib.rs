//! Call surface of the virtual filesystem
//!
//! This crate contains the definitions of the traits implemented by the
//! filesystem, the basic types they exchange, and the reusable error
//! catalogue every operation draws its failure codes from.
//!
//! The filesystem itself lives in the `virtualfs` crate; keeping the
//! surface separate means alternative backends can be tested against the
//! same trait stack and the same shared test-suite (see `fs-tests/`).

#![deny(missing_docs)]

//Error catalogue
pub mod error;

//Basic modules for types
pub mod types;

//Traits the filesystem implements
pub mod fs;
