#![doc = include_str!("../README.md")]

mod affinity;
mod clock;
pub mod config;
mod error;
mod report;
mod result;
mod runner;
mod summary;

// re-exports
pub use affinity::Affinity;
pub use clock::{Stopwatch, Timestamp};
pub use error::{Error, Result};
pub use report::{Encoder, Reporter};
pub use result::MeasurementResult;
pub use runner::Driver;
pub use summary::Summary;

type OwnedTag = (String, String);
type OwnedTags = Vec<OwnedTag>;

/// Optimization level the crate was compiled with, as reported by cargo.
pub const OPT_LEVEL: &str = env!("SAMPLE_DISPATCH_OPT_LEVEL");

/// Build profile name, derived from whether debug assertions are enabled.
pub const fn profile() -> &'static str {
    if cfg!(debug_assertions) { "debug" } else { "release" }
}

/// Tags describing how this binary was built. The measured overhead depends on them, so they are
/// attached to every reported number.
pub fn build_tags() -> Vec<(String, String)> {
    vec![
        ("opt_level".to_owned(), OPT_LEVEL.to_owned()),
        ("profile".to_owned(), profile().to_owned()),
    ]
}
