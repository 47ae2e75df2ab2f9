use crate::Sample;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(Sample),
    #[error("invalid frequency: {frequency} (nyquist is {nyquist})")]
    InvalidFrequency { frequency: Sample, nyquist: Sample },
}
