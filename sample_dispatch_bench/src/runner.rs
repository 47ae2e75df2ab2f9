//! Runs the bind, invoke N times, rebind, invoke N times protocol for each mechanism.

use crate::clock::Stopwatch;
use crate::config::{BenchConfig, GeneratorConfig};
use crate::result::MeasurementResult;
use crate::Result;
use log::{debug, info};
use sample_dispatch::{
    Constant, Mechanism, NextSample, Sample, SampleFn, SampleGenerator, SawtoothOscillator, SquareOscillator,
    Wrapper, full_scale, half_scale,
};
use std::hint::black_box;
use std::time::Duration;

/// Invocations between clock reads while warming up.
const WARMUP_BATCH: u64 = 1024;

pub struct Driver {
    config: BenchConfig,
    stopwatch: Stopwatch,
}

impl Driver {
    pub fn new(config: BenchConfig) -> Result<Self> {
        Self::new_with_stopwatch(config, Stopwatch::new()?)
    }

    pub fn new_with_stopwatch(config: BenchConfig, stopwatch: Stopwatch) -> Result<Self> {
        config.validate()?;
        // fail before any measurement if the oscillators cannot be built
        oscillators(&config.generator)?;
        debug!("clock resolution {:?}", stopwatch.resolution());
        Ok(Self { config, stopwatch })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    /// Runs every configured mechanism, in fixed order, for each round.
    pub fn run(&self) -> Result<Vec<MeasurementResult>> {
        self.warm_up();
        let mechanisms = self.config.ordered_mechanisms();
        let mut results = Vec::with_capacity(self.config.rounds * mechanisms.len());
        for round in 0..self.config.rounds {
            for &mechanism in &mechanisms {
                let result = self.run_round(round, mechanism, self.config.iterations)?;
                info!(
                    "round {} {}: {:.9}s ({:.3}ns/call)",
                    round,
                    mechanism,
                    result.elapsed().as_secs_f64(),
                    result.nanos_per_call()
                );
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Runs both phases of a single mechanism with `iterations` invocations per phase.
    pub fn run_mechanism(&self, mechanism: Mechanism, iterations: u64) -> Result<MeasurementResult> {
        self.run_round(0, mechanism, iterations)
    }

    fn run_round(&self, round: usize, mechanism: Mechanism, iterations: u64) -> Result<MeasurementResult> {
        let (first_phase, second_phase) = match mechanism {
            Mechanism::VirtualDispatch => self.run_virtual_dispatch(iterations)?,
            Mechanism::FunctionPointer => self.run_function_pointer(iterations),
            Mechanism::GenericWrapper => self.run_generic_wrapper(iterations)?,
            Mechanism::TypeErasure => self.run_type_erasure(iterations)?,
        };
        debug!(
            "{} first phase {:?}, second phase {:?}",
            mechanism, first_phase, second_phase
        );
        Ok(MeasurementResult::new(
            round,
            mechanism,
            iterations,
            first_phase,
            second_phase,
        ))
    }

    fn run_virtual_dispatch(&self, iterations: u64) -> Result<(Duration, Duration)> {
        let (mut saw, mut square) = oscillators(&self.config.generator)?;
        // hide the concrete type so every call goes through the vtable
        let mut generator: &mut dyn NextSample = black_box(&mut saw);
        let first = self.phase(iterations, || generator.next_sample());
        generator = black_box(&mut square);
        let second = self.phase(iterations, || generator.next_sample());
        Ok((first, second))
    }

    fn run_function_pointer(&self, iterations: u64) -> (Duration, Duration) {
        // launder the pointers so the calls stay indirect
        let mut function: SampleFn = black_box(half_scale as SampleFn);
        let first = self.phase(iterations, function);
        function = black_box(full_scale as SampleFn);
        let second = self.phase(iterations, function);
        (first, second)
    }

    fn run_generic_wrapper(&self, iterations: u64) -> Result<(Duration, Duration)> {
        let (mut saw, mut square) = oscillators(&self.config.generator)?;
        let mut wrapper = Wrapper::new(&mut saw);
        let first = self.phase(iterations, || wrapper.call());
        // a wrapper cannot change its type, so the second phase needs a new one
        let mut wrapper = Wrapper::new(&mut square);
        let second = self.phase(iterations, || wrapper.call());
        Ok((first, second))
    }

    fn run_type_erasure(&self, iterations: u64) -> Result<(Duration, Duration)> {
        let (mut saw, mut square) = oscillators(&self.config.generator)?;
        let mut generator = SampleGenerator::bind(&mut saw);
        let first = self.phase(iterations, || generator.invoke());
        generator.rebind(&mut square);
        let second = self.phase(iterations, || generator.invoke());
        Ok((first, second))
    }

    #[inline(always)]
    fn phase(&self, iterations: u64, mut invoke: impl FnMut() -> Sample) -> Duration {
        let start = self.stopwatch.start();
        for _ in 0..iterations {
            black_box(invoke());
        }
        self.stopwatch.elapsed(start)
    }

    fn warm_up(&self) {
        if self.config.warmup.is_zero() {
            return;
        }
        debug!("warming up for {:?}", self.config.warmup);
        let mut constant = Constant::new(0.0);
        let mut generator = SampleGenerator::bind(&mut constant);
        let start = self.stopwatch.start();
        while self.stopwatch.elapsed(start) < self.config.warmup {
            for _ in 0..WARMUP_BATCH {
                black_box(generator.invoke());
            }
        }
    }
}

fn oscillators(config: &GeneratorConfig) -> Result<(SawtoothOscillator, SquareOscillator)> {
    Ok((
        SawtoothOscillator::new(config.first_frequency, config.sample_rate)?,
        SquareOscillator::new(config.second_frequency, config.sample_rate)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn driver(iterations: u64) -> Driver {
        Driver::new(BenchConfig::default().with_iterations(iterations)).unwrap()
    }

    #[test]
    fn should_run_every_mechanism_in_order() {
        let results = driver(1_000).run().unwrap();
        let mechanisms: Vec<_> = results.iter().map(MeasurementResult::mechanism).collect();
        assert_eq!(Mechanism::ALL.to_vec(), mechanisms);
        assert!(results.iter().all(|result| result.iterations() == 1_000));
    }

    #[test]
    fn should_repeat_rounds() {
        let config = BenchConfig::default()
            .with_iterations(100)
            .with_rounds(3)
            .with_mechanisms([Mechanism::TypeErasure, Mechanism::VirtualDispatch]);
        let results = Driver::new(config).unwrap().run().unwrap();
        let order: Vec<_> = results
            .iter()
            .map(|result| (result.round(), result.mechanism()))
            .collect();
        assert_eq!(
            vec![
                (0, Mechanism::VirtualDispatch),
                (0, Mechanism::TypeErasure),
                (1, Mechanism::VirtualDispatch),
                (1, Mechanism::TypeErasure),
                (2, Mechanism::VirtualDispatch),
                (2, Mechanism::TypeErasure),
            ],
            order
        );
    }

    #[test]
    fn should_fail_on_invalid_generator() {
        let mut config = BenchConfig::default();
        config.generator.second_frequency = 100_000.0;
        let err = Driver::new(config).err().unwrap();
        assert!(matches!(err, Error::Generator(_)));
    }

    #[test]
    fn should_fail_on_invalid_config() {
        let err = Driver::new(BenchConfig::default().with_iterations(0)).err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn should_warm_up_before_measuring() {
        let config = BenchConfig::default()
            .with_iterations(10)
            .with_warmup(Duration::from_millis(5))
            .with_mechanisms([Mechanism::FunctionPointer]);
        let driver = Driver::new(config).unwrap();
        let stopwatch = Stopwatch::new().unwrap();
        let start = stopwatch.start();
        let results = driver.run().unwrap();
        // separate clocks calibrate independently, hence the slack
        assert!(stopwatch.elapsed(start) >= Duration::from_millis(4));
        assert_eq!(1, results.len());
    }
}
