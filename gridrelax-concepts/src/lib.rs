#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! This crate encapsulates the shared vocabulary of the
//! [gridrelax](https://docs.rs/gridrelax) relaxation engine: the square
//! [Grid], the row-band [Partition] scheme, the four-point averaging stencil
//! and the convergence policies which decide when a relaxation run may stop.
//!
//! The execution backends which drive these concepts over threads and
//! channels live in `gridrelax-core`.

mod convergence;
mod errors;
mod grid;
mod partition;
mod stencil;

pub use convergence::*;
pub use errors::*;
pub use grid::*;
pub use partition::*;
pub use stencil::*;
