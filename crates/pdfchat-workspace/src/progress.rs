//! Upload progress estimation.
//!
//! The remote upload call does not report byte-level progress, so the pipeline asks an
//! estimator for values to show while the transfer is outstanding. The estimator is
//! stateless: the pipeline owns the current value and only ever moves it forward.

use std::time::Duration;

use pdfchat_core::ProgressConfig;

pub trait ProgressEstimator: Send + Sync {
    /// First value shown once the transfer starts. Must be nonzero.
    fn initial(&self) -> u8;

    /// Value to show on the next tick. Never lower than `current`.
    fn next(&self, current: u8) -> u8;

    /// Interval between ticks.
    fn tick(&self) -> Duration;
}

/// Optimistic fixed-step progress: `initial`, then `+step` per tick up to `ceiling`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedProgress {
    initial: u8,
    step: u8,
    ceiling: u8,
    tick: Duration,
}

impl Default for SimulatedProgress {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

impl SimulatedProgress {
    pub fn from_config(config: &ProgressConfig) -> Self {
        Self {
            initial: config.initial,
            step: config.step,
            ceiling: config.ceiling.min(99),
            tick: config.tick,
        }
    }

    pub fn ceiling(&self) -> u8 {
        self.ceiling
    }
}

impl ProgressEstimator for SimulatedProgress {
    fn initial(&self) -> u8 {
        self.initial.max(1)
    }

    fn next(&self, current: u8) -> u8 {
        current.saturating_add(self.step).min(self.ceiling).max(current)
    }

    fn tick(&self) -> Duration {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let progress = SimulatedProgress::default();
        let mut current = progress.initial();
        let mut seen = vec![current];
        for _ in 0..10 {
            current = progress.next(current);
            seen.push(current);
        }
        assert_eq!(
            seen,
            vec![20, 30, 40, 50, 60, 70, 80, 90, 90, 90, 90]
        );
        assert_eq!(progress.tick(), Duration::from_millis(200));
    }

    #[test]
    fn test_next_never_decreases_above_ceiling() {
        let progress = SimulatedProgress::default();
        assert_eq!(progress.next(95), 95);
    }

    #[test]
    fn test_ceiling_kept_below_completion() {
        let progress = SimulatedProgress::from_config(&ProgressConfig {
            initial: 50,
            step: 100,
            ceiling: 100,
            tick: Duration::from_millis(10),
        });
        assert_eq!(progress.ceiling(), 99);
        assert_eq!(progress.next(50), 99);
    }

    #[test]
    fn test_initial_is_nonzero() {
        let progress = SimulatedProgress::from_config(&ProgressConfig {
            initial: 0,
            ..ProgressConfig::default()
        });
        assert_eq!(progress.initial(), 1);
    }
}
