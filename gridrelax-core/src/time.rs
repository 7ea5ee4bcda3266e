//! Counting relaxation rounds and displaying their progress.

use gridrelax_concepts::TimeError;
use kdam::BarExt;
use serde::{Deserialize, Serialize};

/// Tracks how many relaxation rounds have run and enforces an optional
/// safety cap.
///
/// Iterative relaxation has no a-priori round count, so the counter mainly
/// exists to stop runaway runs and to feed the progress bar.
///
/// ```
/// use gridrelax_core::time::RoundCounter;
///
/// let mut counter = RoundCounter::new(Some(2));
/// assert!(counter.advance());
/// assert!(counter.advance());
/// assert!(!counter.advance());
/// assert_eq!(counter.round(), 3);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoundCounter {
    /// Number of rounds started so far.
    current: usize,
    /// Upper bound on the number of rounds, if any.
    max_rounds: Option<usize>,
}

impl RoundCounter {
    /// Fresh counter; `max_rounds` of `None` means unbounded.
    pub fn new(max_rounds: Option<usize>) -> Self {
        Self {
            current: 0,
            max_rounds,
        }
    }

    /// Number of rounds started so far.
    pub fn round(&self) -> usize {
        self.current
    }

    /// Starts the next round. Returns `false` once the cap would be
    /// exceeded, in which case the caller must stop iterating.
    pub fn advance(&mut self) -> bool {
        self.current += 1;
        match self.max_rounds {
            Some(max) => self.current <= max,
            None => true,
        }
    }

    /// Whether the cap forbids starting another round.
    pub fn exhausted(&self) -> bool {
        self.max_rounds.is_some_and(|max| self.current >= max)
    }

    /// Creates the progress bar for this run.
    pub fn initialize_bar(&self) -> Result<kdam::Bar, TimeError> {
        let bar_format = "\
        {desc}{percentage:3.0}%|{animation}| \
        {count}/{total} \
        [{elapsed}, \
        {rate:.2}{unit}/s{postfix}]";
        Ok(kdam::BarBuilder::default()
            .total(self.max_rounds.unwrap_or(0))
            .bar_format(bar_format)
            .dynamic_ncols(true)
            .build()?)
    }

    /// Advances the progress bar by one round.
    pub fn update_bar(&self, bar: &mut kdam::Bar) -> Result<(), std::io::Error> {
        let _ = bar.update(1)?;
        Ok(())
    }
}

#[cfg(test)]
mod test_round_counter {
    use super::*;

    #[test]
    fn unbounded_counter_never_stops() {
        let mut counter = RoundCounter::new(None);
        for round in 1..10_000 {
            assert!(counter.advance());
            assert_eq!(counter.round(), round);
        }
    }

    #[test]
    fn capped_counter_stops_at_the_cap() {
        let mut counter = RoundCounter::new(Some(3));
        assert!(counter.advance());
        assert!(counter.advance());
        assert!(counter.advance());
        assert!(!counter.advance());
        assert!(!counter.advance());
    }

    #[test]
    fn exhaustion_tracks_the_cap() {
        let mut counter = RoundCounter::new(Some(2));
        assert!(!counter.exhausted());
        counter.advance();
        assert!(!counter.exhausted());
        counter.advance();
        assert!(counter.exhausted());
        assert!(!RoundCounter::new(None).exhausted());
    }

    #[test]
    fn bar_can_be_initialized() {
        let counter = RoundCounter::new(Some(100));
        counter.initialize_bar().unwrap();
        let counter = RoundCounter::new(None);
        counter.initialize_bar().unwrap();
    }

    #[test]
    fn serializes_round_trip() {
        let mut counter = RoundCounter::new(Some(7));
        counter.advance();
        let json = serde_json::to_string(&counter).unwrap();
        let back: RoundCounter = serde_json::from_str(&json).unwrap();
        assert_eq!(back.round(), 1);
    }
}
