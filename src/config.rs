//! # Branch and supervisor configuration.
//!
//! [`WaitStrategy`] selects how an idle worker waits for work, [`Limits`]
//! bounds a supervised branch, and [`Config`] bundles the supervisor's
//! defaults. All durations are plain [`Duration`]s; the framework speaks
//! milliseconds throughout.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use arbor::{Config, Limits, WaitStrategy};
//!
//! let mut cfg = Config::default();
//! cfg.limits = Limits::new(2, 8, Duration::from_secs(3));
//! cfg.tick_interval = Duration::from_millis(500);
//!
//! assert_eq!(cfg.limits.max, 8);
//! assert_eq!(WaitStrategy::default(), WaitStrategy::Blocking);
//! ```

use std::time::Duration;

/// Idle workers are rechecked for demotion after this long by default.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default window between supervisor tick callbacks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Practically-unbounded timeout for waits that should not give up.
pub const WAIT_FOREVER: Duration = Duration::from_secs(86_400 * 365);

/// How a worker behaves when its queue is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Busy-wait with a CPU yield per retry. Never sleeps.
    LowLatency,
    /// Yield up to a spin bound, then sleep ~1 ms per retry until work
    /// arrives again.
    Balanced,
    /// Park on the branch's task condvar until a task is queued or the
    /// branch changes state.
    #[default]
    Blocking,
}

/// Worker-count bounds for one supervised branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Lower bound the supervisor shrinks toward.
    pub min: usize,
    /// Upper bound the supervisor grows toward.
    pub max: usize,
    /// A worker idle at least this long is a shrink candidate.
    pub idle_timeout: Duration,
}

impl Limits {
    /// Creates bounds with an explicit idle timeout.
    pub fn new(min: usize, max: usize, idle_timeout: Duration) -> Self {
        let limits = Self { min, max, idle_timeout };
        limits.validate();
        limits
    }

    /// Creates bounds scaled by the machine's logical core count.
    ///
    /// `min = ceil(cores * min_mult)`, `max = ceil(cores * max_mult)`.
    pub fn per_core(min_mult: f64, max_mult: f64) -> Self {
        let cores = num_cpus::get().max(1) as f64;
        Self::new(
            (cores * min_mult).ceil() as usize,
            (cores * max_mult).ceil() as usize,
            DEFAULT_IDLE_TIMEOUT,
        )
    }

    pub(crate) fn validate(&self) {
        assert!(self.max > 0, "worker limit max must be positive");
        assert!(
            self.max >= self.min,
            "worker limits reversed: min {} > max {}",
            self.min,
            self.max
        );
    }
}

impl Default for Limits {
    /// `min = 1`, `max = max(2, cores)`, `idle_timeout = 5 s`.
    fn default() -> Self {
        Self {
            min: 1,
            max: num_cpus::get().max(2),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Supervisor configuration: default branch limits plus tick cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Limits applied by [`Supervisor::supervise`](crate::Supervisor::supervise)
    /// when no explicit limits are given.
    pub limits: Limits,
    /// Window between tick callbacks. Resource correction itself runs every
    /// poll iteration regardless of this value.
    pub tick_interval: Duration,
}

impl Default for Config {
    /// `limits = Limits::default()`, `tick_interval = 1 s`.
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_is_the_default_strategy() {
        assert_eq!(WaitStrategy::default(), WaitStrategy::Blocking);
    }

    #[test]
    fn default_limits_are_sane() {
        let limits = Limits::default();
        assert_eq!(limits.min, 1);
        assert!(limits.max >= 2);
        assert_eq!(limits.idle_timeout, DEFAULT_IDLE_TIMEOUT);
    }

    #[test]
    fn per_core_scales_both_bounds() {
        let limits = Limits::per_core(1.0, 2.0);
        assert!(limits.min >= 1);
        assert!(limits.max >= limits.min);
    }

    #[test]
    #[should_panic(expected = "reversed")]
    fn reversed_limits_are_rejected() {
        Limits::new(4, 2, DEFAULT_IDLE_TIMEOUT);
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn zero_max_is_rejected() {
        Limits::new(0, 0, DEFAULT_IDLE_TIMEOUT);
    }
}
