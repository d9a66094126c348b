//! curved-bench: CLI tool for simplification timing and determinism checks.
//!
//! Generates a synthetic curve (or loads one from a JSON file), simplifies
//! it one or more times, and prints diagnostics for each run. Useful for:
//!
//! - Measuring how long large curves take, with and without `parallel`
//! - Tuning the tolerance against a representative input
//! - Confirming repeated runs retain exactly the same points
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin curved-bench -- [OPTIONS]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use curved::boundary::{points_from_rows, uniform_arity};
use curved::{
    Point, Polyline, Simplified, SimplifyConfig, SimplifyDiagnostics, SimplifyError, SystemClock,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Curve simplification timing and diagnostics.
///
/// Simplifies a generated or loaded curve with a configurable tolerance and
/// prints timing, point counts and engine work counters.
#[derive(Parser)]
#[command(name = "curved-bench", version)]
struct Cli {
    /// Synthetic curve to generate.
    #[arg(long, value_enum, default_value_t = Scenario::Ramp2d)]
    scenario: Scenario,

    /// Number of points to generate.
    #[arg(long, default_value_t = 10_000, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    points: usize,

    /// Simplification tolerance in coordinate units.
    #[arg(long, default_value_t = 0.1)]
    tolerance: f64,

    /// Seed for the random coordinates.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Load the curve from a JSON array of coordinate rows instead of
    /// generating one.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Log engine decisions to stderr.
    #[arg(long)]
    verbose: bool,

    /// Full simplify config as a JSON string.
    ///
    /// When provided, `--tolerance` is ignored. The JSON must be a valid
    /// `SimplifyConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Synthetic curve selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// x = 0..N, y uniform in [0, 1).
    Ramp2d,
    /// x = 0..N, y and z uniform in [0, 1).
    Ramp3d,
    /// Noisy circle of radius 100, closed by repeating the first point.
    /// Needs at least two points.
    Circle,
    /// Monotone staircase; every split peels off the next step.
    Staircase,
}

impl Scenario {
    /// Smallest `--points` the scenario can generate exactly.
    const fn min_points(self) -> usize {
        match self {
            Self::Circle => 2,
            Self::Ramp2d | Self::Ramp3d | Self::Staircase => 1,
        }
    }
}

/// Reject a point count the scenario cannot produce exactly.
fn check_points(scenario: Scenario, points: usize) -> Result<(), String> {
    let min = scenario.min_points();
    if points < min {
        return Err(format!(
            "--scenario {scenario:?} needs --points {min} or more, got {points}"
        ));
    }
    Ok(())
}

/// A curve of either supported dimensionality.
enum Curve {
    Planar(Polyline<2>),
    Spatial(Polyline<3>),
}

impl Curve {
    #[allow(clippy::cast_precision_loss)]
    fn generate(scenario: Scenario, n: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        match scenario {
            Scenario::Ramp2d => Self::Planar(
                (0..n)
                    .map(|i| Point::xy(i as f64, rng.random()))
                    .collect(),
            ),
            Scenario::Ramp3d => Self::Spatial(
                (0..n)
                    .map(|i| Point::xyz(i as f64, rng.random(), rng.random()))
                    .collect(),
            ),
            Scenario::Circle => {
                let segments = n.saturating_sub(1).max(1);
                let mut points: Vec<Point<2>> = (0..segments)
                    .map(|i| {
                        let angle = TAU * i as f64 / segments as f64;
                        let radius = 100.0 + rng.random_range(-0.05..0.05);
                        Point::xy(radius * angle.cos(), radius * angle.sin())
                    })
                    .collect();
                if let Some(&first) = points.first() {
                    points.push(first);
                }
                Self::Planar(Polyline::new(points))
            }
            Scenario::Staircase => Self::Planar(
                (0..n)
                    .map(|i| Point::xy(i.div_ceil(2) as f64, (i / 2) as f64))
                    .collect(),
            ),
        }
    }

    fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SimplifyError> {
        match uniform_arity(rows)? {
            None | Some(2) => Ok(Self::Planar(points_from_rows(rows)?)),
            Some(3) => Ok(Self::Spatial(points_from_rows(rows)?)),
            Some(arity) => Err(SimplifyError::UnsupportedDimensionality { arity }),
        }
    }

    const fn len(&self) -> usize {
        match self {
            Self::Planar(pl) => pl.len(),
            Self::Spatial(pl) => pl.len(),
        }
    }

    const fn dimensions(&self) -> usize {
        match self {
            Self::Planar(_) => 2,
            Self::Spatial(_) => 3,
        }
    }

    fn simplify(
        &self,
        config: &SimplifyConfig,
    ) -> Result<(Simplified, SimplifyDiagnostics), SimplifyError> {
        match self {
            Self::Planar(pl) => curved::simplify_with_diagnostics(pl, config, &SystemClock),
            Self::Spatial(pl) => curved::simplify_with_diagnostics(pl, config, &SystemClock),
        }
    }
}

/// Minimal stderr logger for `--verbose`.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logger(verbose: bool) {
    if !verbose {
        return;
    }
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

/// Build a [`SimplifyConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and
/// `--tolerance` is ignored.
fn config_from_cli(cli: &Cli) -> Result<SimplifyConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }
    Ok(SimplifyConfig::new(cli.tolerance))
}

/// Read a JSON array of coordinate rows.
fn read_rows(path: &Path) -> Result<Vec<Vec<f64>>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let (curve, rows) = if let Some(ref path) = cli.input {
        let rows = match read_rows(path) {
            Ok(rows) => rows,
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        };
        match Curve::from_rows(&rows) {
            Ok(curve) => {
                eprintln!("Input: {} ({} points)", path.display(), curve.len());
                (curve, Some(rows))
            }
            Err(e) => {
                eprintln!("Invalid input {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    } else {
        if let Err(msg) = check_points(cli.scenario, cli.points) {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
        eprintln!(
            "Scenario: {:?} ({} points, seed {})",
            cli.scenario, cli.points, cli.seed,
        );
        (Curve::generate(cli.scenario, cli.points, cli.seed), None)
    };

    eprintln!("Dimensions: {}", curve.dimensions());
    eprintln!("Config: {config:#?}");
    eprintln!("Parallel: {}", curved::parallel::ENABLED);
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match curve.simplify(&config) {
            Ok((_, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }
                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Simplify error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    if let Err(msg) = check_determinism(&all_diagnostics, rows.as_deref(), &config) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Fail if any run retained different points than the first, or if the
/// row entry point disagrees with the typed one.
fn check_determinism(
    all_diagnostics: &[SimplifyDiagnostics],
    rows: Option<&[Vec<f64>]>,
    config: &SimplifyConfig,
) -> Result<(), String> {
    let Some(first) = all_diagnostics.first() else {
        return Ok(());
    };
    let expected = first.metrics.fingerprint;

    if let Some((run, d)) = all_diagnostics
        .iter()
        .enumerate()
        .find(|(_, d)| d.metrics.fingerprint != expected)
    {
        return Err(format!(
            "Nondeterministic result: run {} fingerprint {:016x} != run 1 fingerprint {expected:016x}",
            run + 1,
            d.metrics.fingerprint,
        ));
    }

    if let Some(rows) = rows {
        let via_rows = curved::simplify_rows(rows, config)
            .map_err(|e| format!("Simplify error on rows: {e}"))?
            .fingerprint();
        if via_rows != expected {
            return Err(format!(
                "Row entry point fingerprint {via_rows:016x} != typed fingerprint {expected:016x}"
            ));
        }
    }

    Ok(())
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SimplifyDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| curved::diagnostics::duration_ms(d.duration))
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    let m = &first.metrics;
    let points_per_ms = if mean > 0.0 {
        m.points_before as f64 / mean
    } else {
        0.0
    };
    println!(
        "Throughput: {points_per_ms:.0} input points/ms  |  {} -> {} pts",
        m.points_before, m.points_after,
    );
    println!(
        "Distance evals per point: {:.2}",
        first.stats.distance_evaluations as f64 / m.points_before.max(1) as f64,
    );
}
