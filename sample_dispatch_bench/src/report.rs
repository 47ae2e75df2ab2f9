use crate::config::ReportConfig;
use crate::result::MeasurementResult;
use crate::summary::Summary;
use crate::{OwnedTags, build_tags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

const MEASUREMENT: &str = "dispatch";
const SUMMARY_MEASUREMENT: &str = "dispatch_summary";

/// Writes measurements to any `Write` sink using the configured encoder.
///
/// ```
/// use sample_dispatch::Mechanism;
/// use sample_dispatch_bench::config::ReportConfig;
/// use sample_dispatch_bench::{MeasurementResult, Reporter};
/// use std::time::Duration;
///
/// let result = MeasurementResult::new(0, Mechanism::TypeErasure, 10, Duration::from_secs(1), Duration::ZERO);
/// let mut reporter = Reporter::new(Vec::new(), &ReportConfig::default());
/// reporter.report_results(&[result]).unwrap();
/// let text = String::from_utf8(reporter.into_inner()).unwrap();
/// assert!(text.contains("4. type erasure"));
/// ```
pub struct Reporter<W> {
    writer: W,
    encoder: Encoder,
    tags: OwnedTags,
}

impl<W: Write> Reporter<W> {
    /// Creates a reporter attaching the configured tags plus the build profile tags. Each key
    /// appears once; a configured tag named like a build tag is replaced by the build value.
    pub fn new(writer: W, config: &ReportConfig) -> Self {
        let mut tags = build_tags();
        for (key, value) in &config.tags {
            if !tags.iter().any(|(existing, _)| existing == key) {
                tags.push((key.clone(), value.clone()));
            }
        }
        tags.sort_unstable();
        Self {
            writer,
            encoder: config.encoder.clone(),
            tags,
        }
    }

    pub fn report_results(&mut self, results: &[MeasurementResult]) -> std::io::Result<()> {
        let timestamp = current_time_ns();
        self.encoder.encode_header(&self.tags, &mut self.writer)?;
        for result in results {
            self.encoder
                .encode_result(result, &self.tags, timestamp, &mut self.writer)?;
        }
        self.writer.flush()
    }

    pub fn report_summaries(&mut self, summaries: &[Summary]) -> std::io::Result<()> {
        let timestamp = current_time_ns();
        for summary in summaries {
            self.encoder
                .encode_summary(summary, &self.tags, timestamp, &mut self.writer)?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encoder {
    #[default]
    Text,
    LineProtocol,
    Json,
}

impl Encoder {
    pub fn encode_header(&self, tags: &OwnedTags, dst: &mut impl Write) -> std::io::Result<()> {
        match self {
            Encoder::Text => Text::encode_header(tags, dst),
            Encoder::LineProtocol | Encoder::Json => Ok(()),
        }
    }

    pub fn encode_result(
        &self,
        result: &MeasurementResult,
        tags: &OwnedTags,
        timestamp: u64,
        dst: &mut impl Write,
    ) -> std::io::Result<()> {
        match self {
            Encoder::Text => Text::encode_result(result, dst),
            Encoder::LineProtocol => LineProtocol::encode_result(result, tags, timestamp, dst),
            Encoder::Json => Json::encode(&ResultWithTimestamp::new(result, tags, timestamp), dst),
        }
    }

    pub fn encode_summary(
        &self,
        summary: &Summary,
        tags: &OwnedTags,
        timestamp: u64,
        dst: &mut impl Write,
    ) -> std::io::Result<()> {
        match self {
            Encoder::Text => Text::encode_summary(summary, dst),
            Encoder::LineProtocol => LineProtocol::encode_summary(summary, tags, timestamp, dst),
            Encoder::Json => Json::encode(&SummaryWithTimestamp::new(summary, tags, timestamp), dst),
        }
    }
}

struct Text;

impl Text {
    fn encode_header(tags: &OwnedTags, dst: &mut impl Write) -> std::io::Result<()> {
        dst.write_all(b"#")?;
        for tag in tags.iter() {
            write!(dst, " {}={}", tag.0, tag.1)?;
        }
        dst.write_all(b"\n")
    }

    fn encode_result(result: &MeasurementResult, dst: &mut impl Write) -> std::io::Result<()> {
        let mechanism = result.mechanism();
        writeln!(
            dst,
            "{}. {} (round {}, {} iterations per phase)",
            mechanism.ordinal(),
            mechanism.label(),
            result.round(),
            result.iterations()
        )?;
        writeln!(dst, "   first phase: {} seconds", decimal(result.first_phase().as_secs_f64()))?;
        writeln!(dst, "   second phase: {} seconds", decimal(result.second_phase().as_secs_f64()))?;
        writeln!(dst, "   total time: {} seconds", decimal(result.elapsed().as_secs_f64()))?;
        writeln!(dst, "   per call: {} ns", decimal(result.nanos_per_call()))
    }

    fn encode_summary(summary: &Summary, dst: &mut impl Write) -> std::io::Result<()> {
        writeln!(
            dst,
            "{} over {} rounds: min {} ns, p50 {} ns, p99 {} ns, max {} ns, mean {} ns",
            summary.mechanism.label(),
            summary.rounds,
            summary.min,
            summary.p50,
            summary.p99,
            summary.max,
            decimal(summary.mean)
        )
    }
}

fn decimal(value: f64) -> String {
    dtoa::Buffer::new().format(value).to_owned()
}

struct LineProtocol;

impl LineProtocol {
    fn encode_tags(measurement: &str, mechanism: &str, tags: &OwnedTags, dst: &mut impl Write) -> std::io::Result<()> {
        // measurement
        dst.write_all(measurement.as_bytes())?;
        // tags
        dst.write_all(b",mechanism=")?;
        dst.write_all(mechanism.as_bytes())?;
        for tag in tags.iter() {
            dst.write_all(b",")?;
            dst.write_all(tag.0.as_bytes())?;
            dst.write_all(b"=")?;
            dst.write_all(tag.1.as_bytes())?;
        }
        Ok(())
    }

    fn encode_result(
        result: &MeasurementResult,
        tags: &OwnedTags,
        timestamp: u64,
        dst: &mut impl Write,
    ) -> std::io::Result<()> {
        Self::encode_tags(MEASUREMENT, result.mechanism().name(), tags, dst)?;
        dst.write_all(b",round=")?;
        dst.write_all(itoa::Buffer::new().format(result.round()).as_bytes())?;
        // fields
        dst.write_all(b" iterations=")?;
        dst.write_all(itoa::Buffer::new().format(result.iterations()).as_bytes())?;
        dst.write_all(b"u,first_phase=")?;
        dst.write_all(dtoa::Buffer::new().format(result.first_phase().as_secs_f64()).as_bytes())?;
        dst.write_all(b",second_phase=")?;
        dst.write_all(dtoa::Buffer::new().format(result.second_phase().as_secs_f64()).as_bytes())?;
        dst.write_all(b",elapsed=")?;
        dst.write_all(dtoa::Buffer::new().format(result.elapsed().as_secs_f64()).as_bytes())?;
        dst.write_all(b",ns_per_call=")?;
        dst.write_all(dtoa::Buffer::new().format(result.nanos_per_call()).as_bytes())?;
        dst.write_all(b" ")?;
        // timestamp
        dst.write_all(itoa::Buffer::new().format(timestamp).as_bytes())?;
        // new line
        dst.write_all(b"\n")?;
        Ok(())
    }

    fn encode_summary(summary: &Summary, tags: &OwnedTags, timestamp: u64, dst: &mut impl Write) -> std::io::Result<()> {
        Self::encode_tags(SUMMARY_MEASUREMENT, summary.mechanism.name(), tags, dst)?;
        // fields
        dst.write_all(b" rounds=")?;
        dst.write_all(itoa::Buffer::new().format(summary.rounds).as_bytes())?;
        dst.write_all(b"u,min=")?;
        dst.write_all(itoa::Buffer::new().format(summary.min).as_bytes())?;
        dst.write_all(b"u,max=")?;
        dst.write_all(itoa::Buffer::new().format(summary.max).as_bytes())?;
        dst.write_all(b"u,mean=")?;
        dst.write_all(dtoa::Buffer::new().format(summary.mean).as_bytes())?;
        dst.write_all(b",p50=")?;
        dst.write_all(itoa::Buffer::new().format(summary.p50).as_bytes())?;
        dst.write_all(b"u,p99=")?;
        dst.write_all(itoa::Buffer::new().format(summary.p99).as_bytes())?;
        dst.write_all(b"u ")?;
        // timestamp
        dst.write_all(itoa::Buffer::new().format(timestamp).as_bytes())?;
        // new line
        dst.write_all(b"\n")?;
        Ok(())
    }
}

struct Json;

impl Json {
    fn encode(value: &impl Serialize, dst: &mut impl Write) -> std::io::Result<()> {
        serde_json::to_writer(&mut *dst, value)
            .map_err(std::io::Error::other)
            .and_then(|_| dst.write_all(b"\n"))
    }
}

fn tag_map(tags: &OwnedTags) -> BTreeMap<&str, &str> {
    tags.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect()
}

#[derive(Serialize)]
struct ResultWithTimestamp<'a> {
    timestamp: u64,
    tags: BTreeMap<&'a str, &'a str>,
    #[serde(flatten)]
    result: &'a MeasurementResult,
    elapsed: f64,
}

impl<'a> ResultWithTimestamp<'a> {
    fn new(result: &'a MeasurementResult, tags: &'a OwnedTags, timestamp: u64) -> Self {
        Self {
            timestamp,
            tags: tag_map(tags),
            result,
            elapsed: result.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Serialize)]
struct SummaryWithTimestamp<'a> {
    timestamp: u64,
    tags: BTreeMap<&'a str, &'a str>,
    #[serde(flatten)]
    summary: &'a Summary,
}

impl<'a> SummaryWithTimestamp<'a> {
    fn new(summary: &'a Summary, tags: &'a OwnedTags, timestamp: u64) -> Self {
        Self {
            timestamp,
            tags: tag_map(tags),
            summary,
        }
    }
}

fn current_time_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
