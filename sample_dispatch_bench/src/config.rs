use crate::report::Encoder;
use crate::{Error, OwnedTags, Result};
use duration_str::deserialize_duration;
use sample_dispatch::{Mechanism, Sample};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Benchmark config to be passed to the `Driver`.
///
/// ```
/// use sample_dispatch_bench::config::BenchConfig;
///
/// let config: BenchConfig = "iterations: 1000".parse().unwrap();
/// assert_eq!(1000, config.iterations);
/// assert_eq!(1, config.rounds);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BenchConfig {
    /// Number of invocations per phase. This defaults to one billion.
    #[serde(default = "get_default_iterations")]
    pub iterations: u64,
    /// How many times the whole suite is repeated.
    #[serde(default = "get_default_rounds")]
    pub rounds: usize,
    /// Time spent spinning before the first measurement.
    #[serde(deserialize_with = "deserialize_duration")]
    #[serde(default)]
    pub warmup: Duration,
    /// Mechanisms to benchmark. They always run in their fixed order regardless of how they are
    /// listed here.
    #[serde(default = "get_default_mechanisms")]
    pub mechanisms: Vec<Mechanism>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Pin the benchmark thread to this core id.
    #[serde(default)]
    pub affinity_cpu_id: Option<usize>,
    /// Pin the benchmark thread to the core at this index of the available set.
    #[serde(default)]
    pub affinity_cpu_index: Option<usize>,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: get_default_iterations(),
            rounds: get_default_rounds(),
            warmup: Duration::ZERO,
            mechanisms: get_default_mechanisms(),
            generator: GeneratorConfig::default(),
            affinity_cpu_id: None,
            affinity_cpu_index: None,
            report: ReportConfig::default(),
        }
    }
}

impl BenchConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<BenchConfig> {
        Ok(serde_yaml::from_reader(std::fs::File::open(path)?)?)
    }

    pub fn with_iterations(self, iterations: u64) -> BenchConfig {
        BenchConfig { iterations, ..self }
    }

    pub fn with_rounds(self, rounds: usize) -> BenchConfig {
        BenchConfig { rounds, ..self }
    }

    pub fn with_warmup(self, warmup: Duration) -> BenchConfig {
        BenchConfig { warmup, ..self }
    }

    pub fn with_mechanisms(self, mechanisms: impl IntoIterator<Item = Mechanism>) -> BenchConfig {
        BenchConfig {
            mechanisms: mechanisms.into_iter().collect(),
            ..self
        }
    }

    pub fn with_tags(self, tags: OwnedTags) -> BenchConfig {
        BenchConfig {
            report: ReportConfig {
                tags: [self.report.tags, tags].concat(),
                ..self.report
            },
            ..self
        }
    }

    pub fn with_encoder(self, encoder: Encoder) -> BenchConfig {
        BenchConfig {
            report: ReportConfig { encoder, ..self.report },
            ..self
        }
    }

    /// Configured mechanisms in benchmark order, without duplicates.
    pub fn ordered_mechanisms(&self) -> Vec<Mechanism> {
        let mut mechanisms = self.mechanisms.clone();
        mechanisms.sort_unstable();
        mechanisms.dedup();
        mechanisms
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::invalid_config("iterations must be greater than zero"));
        }
        if self.rounds == 0 {
            return Err(Error::invalid_config("rounds must be greater than zero"));
        }
        if self.mechanisms.is_empty() {
            return Err(Error::invalid_config("at least one mechanism is required"));
        }
        Ok(())
    }
}

impl FromStr for BenchConfig {
    type Err = Error;

    fn from_str(config: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(config)?)
    }
}

const fn get_default_iterations() -> u64 {
    1_000_000_000
}

const fn get_default_rounds() -> usize {
    1
}

fn get_default_mechanisms() -> Vec<Mechanism> {
    Mechanism::ALL.to_vec()
}

/// Parameters of the two oscillators each mechanism switches between.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratorConfig {
    #[serde(default = "get_default_sample_rate")]
    pub sample_rate: Sample,
    #[serde(default = "get_default_first_frequency")]
    pub first_frequency: Sample,
    #[serde(default = "get_default_second_frequency")]
    pub second_frequency: Sample,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate: get_default_sample_rate(),
            first_frequency: get_default_first_frequency(),
            second_frequency: get_default_second_frequency(),
        }
    }
}

const fn get_default_sample_rate() -> Sample {
    48_000.0
}

const fn get_default_first_frequency() -> Sample {
    440.0
}

const fn get_default_second_frequency() -> Sample {
    220.0
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub encoder: Encoder,
    /// Extra tags attached to every reported line.
    #[serde_as(as = "HashMap<_, _>")]
    #[serde(default)]
    pub tags: OwnedTags,
}
