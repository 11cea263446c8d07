//! parskel-bench — runs reference kernels through the skeleton dispatcher.
//!
//! Useful for checking scaling on a machine: the same reduction or map is
//! repeated on the shared worker pool and timed, optionally dumping the
//! per-entry call metrics as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use parskel_core::config::load_dotenv;
use parskel_core::{ExecConfig, KernelError, Shape};
use parskel_exec::{
    names, FoldKind, KernelExecutable, MetricsRecorder, Payload, SkeletonDispatcher, WorkPool,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Time map and fold skeletons on the shared worker pool.
#[derive(Parser, Debug)]
#[command(name = "parskel-bench", version, about)]
struct Cli {
    /// Path to a TOML exec config (defaults to PARSKEL_* env vars).
    #[arg(long, env = "PARSKEL_CONFIG")]
    config: Option<PathBuf>,

    /// Worker count override (0 = available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// Large partition threshold override.
    #[arg(long)]
    large_ppt: Option<usize>,

    /// Operation to run.
    #[arg(long, value_enum, default_value_t = Op::FoldAll)]
    op: Op,

    /// Input length.
    #[arg(long, default_value_t = 1_000_000)]
    len: usize,

    /// Row count for fold-rows (input is `rows x len/rows`).
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// Number of timed repetitions.
    #[arg(long, default_value_t = 3)]
    repeat: usize,

    /// Print dispatch metrics as JSON when done.
    #[arg(long)]
    metrics: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Op {
    FoldAll,
    FoldRows,
    Map,
}

// ── Reference kernels ───────────────────────────────────────────────

struct BenchEnv {
    input: Vec<f64>,
}

fn sum(xs: &[f64]) -> f64 {
    xs.iter().sum()
}

fn reference_kernel() -> KernelExecutable<f64, BenchEnv> {
    KernelExecutable::new("increment", |start, _end, payload, env: &BenchEnv| match payload {
        Payload::Elementwise { out, .. } => {
            for (o, x) in out.iter_mut().zip(&env.input[start..]) {
                *o = x + 1.0;
            }
            Ok(())
        }
        other => Err(KernelError::new("increment", other.kind())),
    })
    .with_entry(names::GENERATE, |_, _, payload, _| match payload {
        Payload::Elementwise { out, .. } => {
            out.fill(0.0);
            Ok(())
        }
        other => Err(KernelError::new(names::GENERATE, other.kind())),
    })
    .with_entry(names::FOLD_ALL_SEQUENTIAL, |start, end, payload, env: &BenchEnv| {
        match payload {
            Payload::FoldAll { out } => {
                out[0] = sum(&env.input[start..end]);
                Ok(())
            }
            other => Err(KernelError::new(names::FOLD_ALL_SEQUENTIAL, other.kind())),
        }
    })
    .with_entry(names::FOLD_ALL_PARTIAL, |start, _end, payload, env: &BenchEnv| {
        match payload {
            Payload::FoldPartial { stripe, partials } => {
                for (k, p) in partials.iter_mut().enumerate() {
                    let lo = (start + k) * stripe;
                    let hi = (lo + stripe).min(env.input.len());
                    *p = sum(&env.input[lo..hi]);
                }
                Ok(())
            }
            other => Err(KernelError::new(names::FOLD_ALL_PARTIAL, other.kind())),
        }
    })
    .with_entry(names::FOLD_ALL_COMBINE, |_, _, payload, _| match payload {
        Payload::FoldCombine { partials, out } => {
            out[0] = sum(partials);
            Ok(())
        }
        other => Err(KernelError::new(names::FOLD_ALL_COMBINE, other.kind())),
    })
    .with_entry(names::FOLD_ROWS, |start, _end, payload, env: &BenchEnv| match payload {
        Payload::FoldRows { inner, out } => {
            for (k, o) in out.iter_mut().enumerate() {
                let row = start + k;
                *o = sum(&env.input[row * inner..(row + 1) * inner]);
            }
            Ok(())
        }
        other => Err(KernelError::new(names::FOLD_ROWS, other.kind())),
    })
}

// ── Main ────────────────────────────────────────────────────────────

fn load_config(cli: &Cli) -> Result<ExecConfig> {
    let mut config = match &cli.config {
        Some(path) => ExecConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExecConfig::from_env(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(large_ppt) = cli.large_ppt {
        ensure!(large_ppt > 0, "--large-ppt must be at least 1");
        config.large_ppt = large_ppt;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let cli = Cli::parse();
    ensure!(cli.rows > 0, "--rows must be at least 1");

    let config = load_config(&cli)?;
    config.log_summary();

    let pool = WorkPool::init_global(&config).context("failed to start worker pool")?;
    let recorder = Arc::new(MetricsRecorder::new());
    let dispatcher =
        SkeletonDispatcher::from_config(pool, &config).with_instrument(recorder.clone());

    let exe = reference_kernel();
    let env = BenchEnv {
        input: (0..cli.len).map(|i| (i % 97) as f64).collect(),
    };
    let row_shape = Shape::from([cli.rows, cli.len / cli.rows]);

    info!(
        "Running {:?} over {} elements on {} workers",
        cli.op,
        cli.len,
        pool.size()
    );

    for run in 1..=cli.repeat {
        let started = Instant::now();
        let out = match cli.op {
            Op::FoldAll => dispatcher.fold_all(&exe, &env, cli.len, FoldKind::Exclusive)?,
            Op::FoldRows => dispatcher.fold_rows(&exe, &env, &row_shape, FoldKind::Exclusive)?,
            Op::Map => dispatcher.map(&exe, &env, &Shape::from([cli.len]))?,
        };
        let elapsed = started.elapsed();
        println!(
            "run {:>3}: {:?} shape={} checksum={} in {:.3}ms",
            run,
            cli.op,
            out.shape(),
            sum(out.as_slice()),
            elapsed.as_secs_f64() * 1000.0
        );
    }

    if cli.metrics {
        let snapshot = recorder.snapshot();
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to serialize metrics")?
        );
    }

    Ok(())
}
