//! Concrete sample generators.
//!
//! Every generator routes its output through [`black_box`] so a tight loop of calls cannot be
//! folded away by the optimizer, even when the result is ignored by the caller.

use crate::{Error, NextSample, Result, Sample};
use std::hint::black_box;

/// Phase accumulator shared by the oscillators. The phase always stays in `[0, 1)`.
#[derive(Debug, Clone, PartialEq)]
struct Phase {
    value: Sample,
    increment: Sample,
}

impl Phase {
    fn new(frequency: Sample, sample_rate: Sample) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        let nyquist = sample_rate / 2.0;
        if !frequency.is_finite() || !(0.0..=nyquist).contains(&frequency) {
            return Err(Error::InvalidFrequency { frequency, nyquist });
        }
        Ok(Self {
            value: 0.0,
            increment: frequency / sample_rate,
        })
    }

    #[inline]
    fn advance(&mut self) {
        self.value += self.increment;
        if self.value >= 1.0 {
            self.value -= 1.0;
        }
    }
}

/// Naive (non band-limited) sawtooth ranging over `[-1, 1)`.
///
/// ```
/// use sample_dispatch::{NextSample, SawtoothOscillator};
///
/// let mut saw = SawtoothOscillator::new(12_000.0, 48_000.0).unwrap();
/// assert_eq!(-1.0, saw.next_sample());
/// assert_eq!(-0.5, saw.next_sample());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SawtoothOscillator {
    phase: Phase,
}

impl SawtoothOscillator {
    pub fn new(frequency: Sample, sample_rate: Sample) -> Result<Self> {
        Ok(Self {
            phase: Phase::new(frequency, sample_rate)?,
        })
    }

    /// Current position within the cycle, in `[0, 1)`.
    pub fn phase(&self) -> Sample {
        self.phase.value
    }
}

impl NextSample for SawtoothOscillator {
    #[inline]
    fn next_sample(&mut self) -> Sample {
        let sample = 2.0 * self.phase.value - 1.0;
        self.phase.advance();
        black_box(sample)
    }
}

/// Square wave with a 50% duty cycle, emitting `1.0` for the first half of each cycle and `-1.0`
/// for the second.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareOscillator {
    phase: Phase,
}

impl SquareOscillator {
    pub fn new(frequency: Sample, sample_rate: Sample) -> Result<Self> {
        Ok(Self {
            phase: Phase::new(frequency, sample_rate)?,
        })
    }

    pub fn phase(&self) -> Sample {
        self.phase.value
    }
}

impl NextSample for SquareOscillator {
    #[inline]
    fn next_sample(&mut self) -> Sample {
        let sample = if self.phase.value < 0.5 { 1.0 } else { -1.0 };
        self.phase.advance();
        black_box(sample)
    }
}

/// Emits the same value forever and never changes state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    value: Sample,
}

impl Constant {
    pub const fn new(value: Sample) -> Self {
        Self { value }
    }
}

impl NextSample for Constant {
    #[inline]
    fn next_sample(&mut self) -> Sample {
        black_box(self.value)
    }
}

/// Stateless source used by the function pointer mechanism.
#[inline(never)]
pub fn half_scale() -> Sample {
    black_box(0.5)
}

/// Stateless source used by the function pointer mechanism.
#[inline(never)]
pub fn full_scale() -> Sample {
    black_box(1.0)
}
