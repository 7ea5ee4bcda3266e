#![deny(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! This crate collects the execution backends of the
//! [gridrelax](https://docs.rs/gridrelax) relaxation engine together with
//! run configuration, round counting and a single-threaded reference solver.
//!
//! ## Backends
//! Three backends relax the same grids with different concurrency models.
//! [backend::lockcell] shares the grid between free-running sweep workers
//! guarded by a per-cell lock table, [backend::jacobi] runs lockstep barrier
//! rounds over row bands and [backend::banded] gives every worker private
//! row bands connected only through channels. The latter two produce results
//! identical to [reference::relax_reference]; the lockcell backend trades
//! that determinism for unsynchronised progress.

pub mod backend;

pub mod config;

pub mod reference;

pub mod time;

#[doc(hidden)]
pub use rayon;
