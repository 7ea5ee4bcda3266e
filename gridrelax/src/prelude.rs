// Vocabulary
pub use gridrelax_concepts::{
    four_point_average, partition_rows, relax_row, ConvergencePolicy, Grid, Partition,
    RoundConvergence, StreakConvergence,
};

// Error types
pub use gridrelax_concepts::{
    BoundaryError, CalcError, CommunicationError, IndexError, SetupError, TimeError,
};

// Backends and outcome
pub use gridrelax_core::backend::{relax, RelaxError, RelaxOutcome};
pub use gridrelax_core::backend::banded::relax_banded;
pub use gridrelax_core::backend::jacobi::relax_jacobi;
pub use gridrelax_core::backend::lockcell::{relax_lockcell, AtomicStore};

// Configuration and round counting
pub use gridrelax_core::config::{BackendChoice, RelaxSettings};
pub use gridrelax_core::reference::relax_reference;
pub use gridrelax_core::time::RoundCounter;
