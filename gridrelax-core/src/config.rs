//! Run configuration for the relaxation backends.

use num::Float;
use serde::{Deserialize, Serialize};

use gridrelax_concepts::SetupError;

/// Selects which execution backend carries out the relaxation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BackendChoice {
    /// Shared-memory sweeps with a per-cell lock table and streak-based
    /// convergence.
    LockCell,
    /// Barrier-synchronised threads over a shared double buffer with
    /// per-round convergence.
    Jacobi,
    /// Message-passing row bands with halo exchange and a convergence
    /// coordinator.
    Banded,
}

/// Validated settings of one relaxation run.
///
/// ```
/// use gridrelax_core::config::{BackendChoice, RelaxSettings};
///
/// let settings = RelaxSettings::new(4, 1e-3)
///     .unwrap()
///     .with_backend(BackendChoice::Banded)
///     .with_max_rounds(Some(10_000));
/// assert_eq!(settings.n_workers, 4);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RelaxSettings<F = f64> {
    /// Number of worker threads to spawn. Backends clamp this down when the
    /// grid has fewer interior rows than workers.
    pub n_workers: usize,
    /// Convergence precision; differences below it count as quiet.
    pub precision: F,
    /// Which backend executes the run.
    pub backend: BackendChoice,
    /// Optional cap on the number of rounds, after which the run returns
    /// unconverged.
    pub max_rounds: Option<usize>,
    /// Whether to render a progress bar while iterating.
    pub show_progress: bool,
}

impl<F> RelaxSettings<F>
where
    F: Float,
{
    /// Settings with the given worker count and precision; backend defaults
    /// to [BackendChoice::LockCell], no round cap and no progress bar.
    pub fn new(n_workers: usize, precision: F) -> Result<Self, SetupError> {
        if n_workers == 0 {
            return Err(SetupError(
                "worker count must be at least 1".to_string(),
            ));
        }
        if precision <= F::zero() || !precision.is_finite() {
            return Err(SetupError(
                "precision must be a positive finite value".to_string(),
            ));
        }
        Ok(Self {
            n_workers,
            precision,
            backend: BackendChoice::LockCell,
            max_rounds: None,
            show_progress: false,
        })
    }

    /// Changes the backend.
    pub fn with_backend(mut self, backend: BackendChoice) -> Self {
        self.backend = backend;
        self
    }

    /// Changes the round cap.
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Enables or disables the progress bar.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}
