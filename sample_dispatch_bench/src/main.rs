use log::info;
use sample_dispatch_bench::config::BenchConfig;
use sample_dispatch_bench::{Affinity, Driver, Reporter, Summary, profile, OPT_LEVEL};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => BenchConfig::from_file(path)?,
        None => BenchConfig::default(),
    };
    info!(
        "running {} iterations per phase, {} round(s), profile {} opt-level {}",
        config.iterations,
        config.rounds,
        profile(),
        OPT_LEVEL
    );

    Affinity::try_from(&config)?.pin_current_thread_to_core();

    let driver = Driver::new(config)?;
    let results = driver.run()?;

    let mut reporter = Reporter::new(std::io::stdout().lock(), &driver.config().report);
    reporter.report_results(&results)?;
    if driver.config().rounds > 1 {
        reporter.report_summaries(&Summary::from_results(&results)?)?;
    }
    Ok(())
}
