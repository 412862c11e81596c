use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use clap::{Parser, ValueEnum};
use fare_core::config::default_workers;
use fare_core::{
    run_pipeline, CsvFareSink, CsvRecordSource, FareError, FareSink, MalformedRecordPolicy,
    PipelineConfig, PipelineStats, RideFare,
};
use indicatif::{ProgressBar, ProgressStyle};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "ride-fares",
    about = "Compute taxi ride fares from a stream of GPS pings",
    long_about = "Reads `ride_id,lat,lng,unix_seconds` records, one ride's pings\n\
                  contiguous, and writes one `ride_id,fare` line per ride."
)]
pub struct Cli {
    /// Path records to read (defaults to stdin)
    pub input: Option<PathBuf>,

    /// Where to write fares (defaults to stdout)
    pub output: Option<PathBuf>,

    /// Number of fare workers
    #[arg(long, env = "RIDE_FARES_WORKERS", default_value_t = default_workers())]
    pub workers: usize,

    /// Ride batches queued for workers (defaults to the worker count)
    #[arg(long, env = "RIDE_FARES_WORK_QUEUE")]
    pub work_queue: Option<usize>,

    /// Fares queued for the writer
    #[arg(long, env = "RIDE_FARES_FARE_QUEUE", default_value_t = 10_000)]
    pub fare_queue: usize,

    /// Ride batches in circulation (defaults to twice the worker count)
    #[arg(long, env = "RIDE_FARES_POOL_SIZE")]
    pub pool_size: Option<usize>,

    /// Initial ping capacity of each pooled batch
    #[arg(long, env = "RIDE_FARES_BATCH_CAPACITY", default_value_t = 100)]
    pub batch_capacity: usize,

    /// What to do with records that cannot be parsed
    #[arg(value_enum, long, env = "RIDE_FARES_MALFORMED", default_value_t = Malformed::Fail)]
    pub malformed: Malformed,

    /// UTC offset used for the early-hours rate, e.g. `+03:00`
    #[arg(long, env = "RIDE_FARES_UTC_OFFSET", default_value = "+00:00")]
    pub utc_offset: FixedOffset,

    /// Show a spinner with the number of rides priced
    #[arg(long)]
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Malformed {
    /// Stop at the first malformed record
    Fail,
    /// Log malformed records and continue
    Skip,
}

impl From<Malformed> for MalformedRecordPolicy {
    fn from(value: Malformed) -> Self {
        match value {
            Malformed::Fail => MalformedRecordPolicy::Fail,
            Malformed::Skip => MalformedRecordPolicy::Skip,
        }
    }
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default()
            .with_workers(self.workers)
            .with_fare_queue_capacity(self.fare_queue)
            .with_batch_capacity(self.batch_capacity)
            .with_malformed_records(self.malformed.into())
            .with_utc_offset(self.utc_offset);
        if let Some(capacity) = self.work_queue {
            config = config.with_work_queue_capacity(capacity);
        }
        if let Some(pool_size) = self.pool_size {
            config = config.with_pool_size(pool_size);
        }
        config
    }
}

// ── run ────────────────────────────────────────────────────────────

/// Counts fares on a spinner as they are written.
struct ProgressSink<K> {
    inner: K,
    bar: ProgressBar,
}

impl<K: FareSink> FareSink for ProgressSink<K> {
    fn accept(&mut self, fare: RideFare) -> Result<(), FareError> {
        self.inner.accept(fare)?;
        self.bar.inc(1);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FareError> {
        self.inner.finish()?;
        self.bar.finish_with_message("done");
        Ok(())
    }
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn Read + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} rides priced ({per_sec}) {msg}")
    {
        bar.set_style(style);
    }
    bar
}

pub fn run(cli: &Cli) -> Result<PipelineStats> {
    let config = cli.pipeline_config();
    let mut source = CsvRecordSource::new(open_input(cli.input.as_ref())?);
    let sink = CsvFareSink::new(open_output(cli.output.as_ref())?);

    let result = if cli.progress {
        let mut sink = ProgressSink {
            inner: sink,
            bar: spinner(),
        };
        run_pipeline(&mut source, &mut sink, &config)
    } else {
        let mut sink = sink;
        run_pipeline(&mut source, &mut sink, &config)
    };

    result.context("fare pipeline failed")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const PATHS: &str = "1,37.900000,23.700000,1405598400
1,38.000000,23.700000,1405600200
2,37.950000,23.750000,1405598400
";

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ride-fares").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_follow_worker_count() {
        let cli = cli(&["--workers", "3"]);
        let config = cli.pipeline_config();
        assert_eq!(config.workers, 3);
        assert_eq!(config.work_queue_capacity, 3);
        assert_eq!(config.pool_size, 6);
        assert_eq!(config.malformed_records, MalformedRecordPolicy::Fail);
        assert!(cli.input.is_none() && cli.output.is_none());
    }

    #[test]
    fn parses_every_knob() {
        let cli = cli(&[
            "in.csv",
            "out.csv",
            "--workers",
            "2",
            "--work-queue",
            "1",
            "--pool-size",
            "5",
            "--fare-queue",
            "7",
            "--malformed",
            "skip",
            "--utc-offset",
            "+03:00",
        ]);
        let config = cli.pipeline_config();
        assert_eq!(cli.input, Some(PathBuf::from("in.csv")));
        assert_eq!(cli.output, Some(PathBuf::from("out.csv")));
        assert_eq!(config.work_queue_capacity, 1);
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.fare_queue_capacity, 7);
        assert_eq!(config.malformed_records, MalformedRecordPolicy::Skip);
        assert_eq!(config.utc_offset.local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn prices_a_file_into_a_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("paths.csv");
        let output = dir.path().join("fares.csv");
        fs::write(&input, PATHS).expect("write paths");

        let cli = cli(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--workers",
            "2",
        ]);
        let stats = run(&cli).expect("run should succeed");
        assert_eq!(stats.rides_priced, 2);

        let written = fs::read_to_string(&output).expect("read fares");
        let mut lines: Vec<_> = written.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["1,9.53", "2,3.47"]);
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.csv");
        let cli = cli(&[missing.to_str().unwrap()]);

        let error = run(&cli).err().expect("missing input should fail");
        assert!(error.to_string().contains("failed to open input"));
    }

    #[test]
    fn malformed_input_fails_with_position() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("paths.csv");
        let output = dir.path().join("fares.csv");
        fs::write(&input, "1,37.9,23.7,10\n1,37.9,23.7,soon\n").expect("write paths");

        let cli = cli(&[input.to_str().unwrap(), output.to_str().unwrap()]);
        let error = run(&cli).err().expect("malformed input should fail");
        let root = error.root_cause().to_string();
        assert_eq!(root, "record 2: invalid timestamp value \"soon\"");
    }
}
