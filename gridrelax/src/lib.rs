#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! [gridrelax](crate) iteratively relaxes square grids of floating point
//! values: every interior cell is repeatedly replaced by the average of its
//! four orthogonal neighbours until the values settle within a configured
//! precision, while the border cells stay fixed as boundary conditions.
//!
//! Three backends run the same computation under different concurrency
//! models, from a shared grid with a per-cell lock table to fully private
//! row bands exchanging halo rows over channels. See
//! [core::backend](gridrelax_core::backend) for the trade-offs.
//!
//! ```
//! use gridrelax::prelude::*;
//!
//! let grid: Grid<f64> = Grid::random(32, 1000).unwrap();
//! let settings = RelaxSettings::new(4, 1e-3)
//!     .unwrap()
//!     .with_backend(BackendChoice::Banded);
//! let outcome = relax(grid, &settings).unwrap();
//! assert!(outcome.converged);
//! ```

pub use gridrelax_concepts as concepts;

pub use gridrelax_core as core;

/// Re-exports the default types and functions.
pub mod prelude;
