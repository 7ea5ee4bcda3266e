//! Convergence detection policies.
//!
//! The two execution models stop in deliberately different ways and the two
//! policies are therefore kept as distinct types rather than one configurable
//! criterion. [StreakConvergence] belongs to the asynchronous shared-memory
//! sweeps, [RoundConvergence] to lockstep round-based execution; swapping one
//! for the other changes the observable number of passes a run performs.

use num::Float;
use serde::{Deserialize, Serialize};

/// Observes per-cell update differences and decides when to stop relaxing.
///
/// `begin_pass` is called once before each full sweep over the observed
/// cells, `observe` once per cell update with the absolute difference
/// between the old and new value, and `converged` may be consulted at any
/// point after that.
pub trait ConvergencePolicy<F> {
    /// Marks the start of a new sweep over the observed cells.
    fn begin_pass(&mut self);
    /// Records the absolute difference produced by one cell update.
    fn observe(&mut self, difference: F);
    /// Whether the stopping criterion has been reached.
    fn converged(&self) -> bool;
}

/// Declares convergence after `target` consecutive cell updates in a row
/// stayed below `precision`, counted across sweep boundaries.
///
/// One large difference resets the streak to zero. For a full grid the
/// target is the number of interior cells, so convergence means one entire
/// window of updates was quiet, not that any single sweep was.
///
/// ```
/// use gridrelax_concepts::{ConvergencePolicy, StreakConvergence};
///
/// let mut policy = StreakConvergence::new(0.1, 3);
/// policy.observe(0.05);
/// policy.observe(0.05);
/// policy.observe(2.0); // resets the streak
/// policy.observe(0.0);
/// policy.observe(0.0);
/// assert!(!policy.converged());
/// policy.observe(0.0);
/// assert!(policy.converged());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StreakConvergence<F> {
    /// Differences below this value count towards the streak.
    precision: F,
    /// Streak length at which the run is considered converged.
    target: usize,
    /// Number of consecutive quiet updates seen so far.
    streak: usize,
}

impl<F> StreakConvergence<F>
where
    F: Float,
{
    /// Policy that stops after `target` consecutive quiet updates.
    pub fn new(precision: F, target: usize) -> Self {
        Self {
            precision,
            target,
            streak: 0,
        }
    }

    /// Policy sized for the interior of a square grid: the streak target is
    /// `(dim - 2)^2`, one quiet update per interior cell.
    pub fn for_grid(precision: F, dim: usize) -> Self {
        Self::new(precision, (dim - 2) * (dim - 2))
    }
}

impl<F> ConvergencePolicy<F> for StreakConvergence<F>
where
    F: Float,
{
    fn begin_pass(&mut self) {
        // the streak survives sweep boundaries
    }

    fn observe(&mut self, difference: F) {
        if difference < self.precision {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
    }

    fn converged(&self) -> bool {
        self.streak >= self.target
    }
}

/// Declares convergence when every update of one complete pass stayed below
/// `precision`.
///
/// A single large difference anywhere in the pass vetoes it; the verdict is
/// reset at the start of the next pass.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoundConvergence<F> {
    /// Differences at or above this value veto the current pass.
    precision: F,
    /// Whether every update of the current pass stayed below `precision`.
    within_tolerance: bool,
}

impl<F> RoundConvergence<F>
where
    F: Float,
{
    /// Policy that stops after the first fully quiet pass.
    ///
    /// Starts unconverged: a pass must complete before the verdict means
    /// anything.
    pub fn new(precision: F) -> Self {
        Self {
            precision,
            within_tolerance: false,
        }
    }
}

impl<F> ConvergencePolicy<F> for RoundConvergence<F>
where
    F: Float,
{
    fn begin_pass(&mut self) {
        self.within_tolerance = true;
    }

    fn observe(&mut self, difference: F) {
        if difference >= self.precision {
            self.within_tolerance = false;
        }
    }

    fn converged(&self) -> bool {
        self.within_tolerance
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn streak_carries_across_passes() {
        let mut policy = StreakConvergence::new(0.5, 4);
        policy.begin_pass();
        policy.observe(0.1);
        policy.observe(0.1);
        policy.begin_pass();
        policy.observe(0.1);
        policy.observe(0.1);
        assert!(policy.converged());
    }

    #[test]
    fn streak_resets_on_a_large_difference() {
        let mut policy = StreakConvergence::new(0.5, 2);
        policy.observe(0.0);
        policy.observe(0.5); // not strictly below precision
        policy.observe(0.0);
        assert!(!policy.converged());
        policy.observe(0.0);
        assert!(policy.converged());
    }

    #[test]
    fn grid_sized_streak_target() {
        let policy = StreakConvergence::<f64>::for_grid(0.1, 7);
        let mut policy = policy;
        for _ in 0..24 {
            policy.observe(0.0);
        }
        assert!(!policy.converged());
        policy.observe(0.0);
        assert!(policy.converged());
    }

    #[test]
    fn round_policy_starts_unconverged() {
        let policy = RoundConvergence::<f64>::new(0.1);
        assert!(!policy.converged());
    }

    #[test]
    fn round_policy_vetoes_a_noisy_pass() {
        let mut policy = RoundConvergence::new(0.1);
        policy.begin_pass();
        policy.observe(0.05);
        policy.observe(0.2);
        policy.observe(0.0);
        assert!(!policy.converged());
        policy.begin_pass();
        policy.observe(0.05);
        policy.observe(0.0);
        assert!(policy.converged());
    }

    #[test]
    fn round_policy_resets_each_pass() {
        let mut policy = RoundConvergence::new(1.0);
        policy.begin_pass();
        assert!(policy.converged());
        policy.observe(3.0);
        assert!(!policy.converged());
        policy.begin_pass();
        assert!(policy.converged());
    }
}
