#![doc = include_str!("../README.md")]

mod erased;
mod error;
mod generator;
mod mechanism;

// re-exports
pub use erased::SampleGenerator;
pub use error::{Error, Result};
pub use generator::{Constant, SawtoothOscillator, SquareOscillator, full_scale, half_scale};
pub use mechanism::{Mechanism, SampleFn, Wrapper};

/// A single audio sample.
pub type Sample = f32;

/// The operation every generator exposes: produce the next unit of work.
pub trait NextSample {
    fn next_sample(&mut self) -> Sample;
}

impl<T: NextSample + ?Sized> NextSample for &mut T {
    #[inline]
    fn next_sample(&mut self) -> Sample {
        (**self).next_sample()
    }
}

impl<T: NextSample + ?Sized> NextSample for Box<T> {
    #[inline]
    fn next_sample(&mut self) -> Sample {
        (**self).next_sample()
    }
}
