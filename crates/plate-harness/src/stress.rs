use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use cad_backend::CadBackend;
use plate_builder::PlateBuilder;
use plate_params::ParameterSet;

use crate::resources::{ResourceSample, ResourceSampler};

pub const LOG_HEADER: &str =
    "Iteration\tBuildTimeMs\tUsedRamGb\tCpuProcessPercent\tProcessWorkingSetMb\tStatus";

/// How long a stress run lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressConfig {
    pub iterations: u64,
    /// Sleep between builds.
    pub pause: Duration,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            pause: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StressError {
    #[error("a stress run needs at least one iteration")]
    NoIterations,

    #[error("failed to write stress log: {0}")]
    Log(#[from] std::io::Error),
}

/// Aggregate timings of a stress run. Failed builds count towards the
/// timings too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressSummary {
    pub iterations: u64,
    pub failures: u64,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
}

impl StressSummary {
    pub fn successes(&self) -> u64 {
        self.iterations - self.failures
    }
}

impl fmt::Display for StressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} builds ({} failed): min {} ms, mean {} ms, max {} ms",
            self.iterations,
            self.failures,
            millis(self.min),
            millis(self.mean),
            millis(self.max),
        )
    }
}

/// Mid-range plate that always validates: D 450, T 45, d 50, R 3, L 150,
/// G 15.
pub fn average_parameters() -> ParameterSet {
    ParameterSet::from_values(450.0, 45.0, 50.0, 3.0, 150.0, 15.0)
}

/// Build `params` `config.iterations` times, writing one TSV row per build
/// to `log` and flushing after each row. Each row carries the build time,
/// host RAM in use, and this process's CPU share and resident memory.
///
/// Build failures are logged as rows and counted; only log I/O aborts the
/// run.
pub fn run_stress(
    builder: &PlateBuilder,
    params: &ParameterSet,
    cad: &mut dyn CadBackend,
    config: &StressConfig,
    log: &mut impl Write,
) -> Result<StressSummary, StressError> {
    if config.iterations == 0 {
        return Err(StressError::NoIterations);
    }
    writeln!(log, "{LOG_HEADER}")?;
    log.flush()?;
    let mut sampler = ResourceSampler::new();

    let mut failures = 0;
    let mut min = Duration::MAX;
    let mut max = Duration::ZERO;
    let mut total = Duration::ZERO;

    for iteration in 1..=config.iterations {
        let started = Instant::now();
        let outcome = builder.build(params, cad);
        let elapsed = started.elapsed();
        let resources = sampler.sample();

        let status = match outcome {
            Ok(_) => "ok".to_string(),
            Err(e) => {
                failures += 1;
                tracing::warn!(iteration, error = %e, "stress build failed");
                format!("error: {}", single_line(&e.to_string()))
            }
        };
        writeln!(log, "{}", row(iteration, elapsed, &resources, &status))?;
        log.flush()?;

        min = min.min(elapsed);
        max = max.max(elapsed);
        total += elapsed;

        if iteration < config.iterations && !config.pause.is_zero() {
            std::thread::sleep(config.pause);
        }
    }

    let summary = StressSummary {
        iterations: config.iterations,
        failures,
        min,
        max,
        mean: mean(total, config.iterations),
    };
    tracing::info!(%summary, "stress run finished");
    Ok(summary)
}

fn row(iteration: u64, elapsed: Duration, r: &ResourceSample, status: &str) -> String {
    format!(
        "{iteration}\t{}\t{:.3}\t{:.1}\t{:.1}\t{status}",
        millis(elapsed),
        r.used_ram_gb,
        r.cpu_percent,
        r.working_set_mb,
    )
}

fn millis(d: Duration) -> String {
    format!("{:.0}", d.as_secs_f64() * 1000.0)
}

fn mean(total: Duration, count: u64) -> Duration {
    let nanos = total.as_nanos() / u128::from(count.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn single_line(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}
