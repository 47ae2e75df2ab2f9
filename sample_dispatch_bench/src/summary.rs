use crate::result::MeasurementResult;
use crate::{Error, Result};
use sample_dispatch::Mechanism;
use serde::Serialize;
use std::time::Duration;

/// Distribution of the elapsed time of one mechanism across rounds, in nanoseconds.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub mechanism: Mechanism,
    pub rounds: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p99: u64,
}

impl Summary {
    /// Summarises `results` per mechanism, in benchmark order. Mechanisms without results are
    /// skipped.
    pub fn from_results(results: &[MeasurementResult]) -> Result<Vec<Summary>> {
        let mut summaries = Vec::new();
        for mechanism in Mechanism::ALL {
            let mut histogram = hdrhistogram::Histogram::<u64>::new(3).map_err(Error::other)?;
            for result in results.iter().filter(|result| result.mechanism() == mechanism) {
                histogram
                    .record(as_nanos(result.elapsed()))
                    .map_err(Error::other)?;
            }
            if histogram.is_empty() {
                continue;
            }
            summaries.push(Summary {
                mechanism,
                rounds: histogram.len(),
                min: histogram.min(),
                max: histogram.max(),
                mean: histogram.mean(),
                p50: histogram.value_at_quantile(0.50),
                p99: histogram.value_at_quantile(0.99),
            });
        }
        Ok(summaries)
    }
}

fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(round: usize, mechanism: Mechanism, micros: u64) -> MeasurementResult {
        MeasurementResult::new(round, mechanism, 1, Duration::from_micros(micros), Duration::ZERO)
    }

    #[test]
    fn should_summarise_per_mechanism() {
        let results = vec![
            result(0, Mechanism::TypeErasure, 10),
            result(0, Mechanism::VirtualDispatch, 40),
            result(1, Mechanism::TypeErasure, 20),
            result(1, Mechanism::VirtualDispatch, 40),
            result(2, Mechanism::TypeErasure, 30),
            result(2, Mechanism::VirtualDispatch, 40),
        ];

        let summaries = Summary::from_results(&results).unwrap();
        assert_eq!(2, summaries.len());

        let virtual_dispatch = &summaries[0];
        assert_eq!(Mechanism::VirtualDispatch, virtual_dispatch.mechanism);
        assert_eq!(3, virtual_dispatch.rounds);

        let type_erasure = &summaries[1];
        assert_eq!(Mechanism::TypeErasure, type_erasure.mechanism);
        assert_eq!(3, type_erasure.rounds);
        // 3 significant digits
        assert!(type_erasure.min.abs_diff(10_000) <= 10);
        assert!(type_erasure.max.abs_diff(30_000) <= 30);
        assert!((type_erasure.mean - 20_000.0).abs() <= 20.0);
    }

    #[test]
    fn should_return_nothing_for_no_results() {
        assert!(Summary::from_results(&[]).unwrap().is_empty());
    }
}
