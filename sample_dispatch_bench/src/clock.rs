use crate::{Error, Result};
use quanta::Clock;
use std::sync::atomic::{Ordering, compiler_fence};
use std::time::Duration;

/// Upper bound on reads before the clock is declared stuck.
const MAX_CALIBRATION_READS: usize = 1_000_000;

/// Independent measurements taken by [`Stopwatch::resolution`].
const RESOLUTION_SAMPLES: usize = 16;

/// Raw clock reading taken by [`Stopwatch::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(u64);

/// Monotonic, high resolution timer used to measure each phase.
///
/// Every reading is surrounded by compiler fences so the optimizer cannot move invocations across
/// a phase boundary.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    clock: Clock,
}

impl Stopwatch {
    pub fn new() -> Result<Self> {
        Self::with_clock(Clock::new())
    }

    /// Uses the supplied clock, which must be observed to advance.
    pub fn with_clock(clock: Clock) -> Result<Self> {
        let stopwatch = Self { clock };
        stopwatch.ensure_advancing()?;
        Ok(stopwatch)
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        compiler_fence(Ordering::SeqCst);
        let raw = self.clock.raw();
        compiler_fence(Ordering::SeqCst);
        Timestamp(raw)
    }

    #[inline]
    pub fn elapsed(&self, start: Timestamp) -> Duration {
        let end = self.start();
        self.clock.delta(start.0, end.0)
    }

    /// Smallest non-zero step observed between two consecutive readings. Any elapsed time is only
    /// known to within this step at each end.
    pub fn resolution(&self) -> Duration {
        let mut resolution = None::<Duration>;
        for _ in 0..RESOLUTION_SAMPLES {
            let Some(step) = self.next_step() else {
                continue;
            };
            resolution = Some(resolution.map_or(step, |current| current.min(step)));
        }
        // a clock that ticks faster than a nanosecond still reports whole nanoseconds
        resolution.unwrap_or(Duration::from_nanos(1))
    }

    fn next_step(&self) -> Option<Duration> {
        let first = self.clock.raw();
        for _ in 0..MAX_CALIBRATION_READS {
            let next = self.clock.raw();
            if next != first {
                let step = self.clock.delta(first, next);
                return (!step.is_zero()).then_some(step);
            }
        }
        None
    }

    fn ensure_advancing(&self) -> Result<()> {
        let first = self.clock.raw();
        for _ in 0..MAX_CALIBRATION_READS {
            if self.clock.raw() != first {
                return Ok(());
            }
        }
        Err(Error::ClockUnavailable(MAX_CALIBRATION_READS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_measure_elapsed_time_with_mock_clock() {
        let (clock, mock) = Clock::mock();
        mock.increment(Duration::from_nanos(1));
        let stopwatch = Stopwatch { clock };
        let start = stopwatch.start();
        mock.increment(Duration::from_millis(250));
        assert_eq!(Duration::from_millis(250), stopwatch.elapsed(start));
    }

    #[test]
    fn should_reject_stuck_clock() {
        let (clock, _mock) = Clock::mock();
        let err = Stopwatch::with_clock(clock).unwrap_err();
        assert!(matches!(err, Error::ClockUnavailable(_)));
    }

    #[test]
    fn should_fall_back_to_one_nanosecond_resolution_for_stuck_clock() {
        let (clock, _mock) = Clock::mock();
        let stopwatch = Stopwatch { clock };
        assert_eq!(Duration::from_nanos(1), stopwatch.resolution());
    }

    #[test]
    fn should_measure_resolution_of_real_clock() {
        let stopwatch = Stopwatch::new().unwrap();
        let resolution = stopwatch.resolution();
        assert!(resolution >= Duration::from_nanos(1));
        assert!(resolution < Duration::from_millis(1), "{resolution:?}");
    }

    #[test]
    fn should_be_monotonic() {
        let stopwatch = Stopwatch::new().unwrap();
        let start = stopwatch.start();
        let first = stopwatch.elapsed(start);
        let second = stopwatch.elapsed(start);
        assert!(second >= first);
    }
}
