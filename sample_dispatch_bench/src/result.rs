use sample_dispatch::Mechanism;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Timing of one mechanism in one round: the first phase runs against the first concrete type, the
/// second phase against the second after rebinding.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MeasurementResult {
    round: usize,
    mechanism: Mechanism,
    iterations: u64,
    #[serde(serialize_with = "serialize_secs")]
    first_phase: Duration,
    #[serde(serialize_with = "serialize_secs")]
    second_phase: Duration,
}

impl MeasurementResult {
    pub fn new(
        round: usize,
        mechanism: Mechanism,
        iterations: u64,
        first_phase: Duration,
        second_phase: Duration,
    ) -> Self {
        Self {
            round,
            mechanism,
            iterations,
            first_phase,
            second_phase,
        }
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// Invocations per phase.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn first_phase(&self) -> Duration {
        self.first_phase
    }

    pub fn second_phase(&self) -> Duration {
        self.second_phase
    }

    /// Time spent in both phases.
    pub fn elapsed(&self) -> Duration {
        self.first_phase + self.second_phase
    }

    /// Average cost of a single invocation across both phases.
    pub fn nanos_per_call(&self) -> f64 {
        // `2 * iterations` can overflow u64
        self.elapsed().as_nanos() as f64 / (2.0 * self.iterations as f64)
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
