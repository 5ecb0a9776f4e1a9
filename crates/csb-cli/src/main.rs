//! CLI driver for the concurrent micro-benchmark harness.

use clap::{Parser, ValueEnum};
use log::error;

use csb_core::{BmError, Harness, Parameters, Target};
use csb_targets::{AlternatingTarget, ConcurrentMapTarget, LatencyConfig, LatencyTarget, NoopTarget};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetKind {
    Noop,
    Latency,
    Map,
    Alternating,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "csb")]
#[command(about = "A concurrent micro-benchmark harness for pluggable targets")]
#[command(version = csb_core::VERSION)]
struct Cli {
    /// Number of worker threads.
    #[arg(short = 't', long, default_value_t = 4)]
    threads: usize,

    /// Run-phase duration, in seconds.
    #[arg(short = 'd', long, default_value_t = 5)]
    duration: u64,

    /// Initial data-structure size passed to the target.
    #[arg(short = 's', long, default_value_t = 0)]
    initial_size: usize,

    /// Operation weights, comma-separated, summing to exactly 1024. Defaults
    /// to a single weight matching the target's own operation count.
    #[arg(short = 'w', long, value_delimiter = ',')]
    weights: Option<Vec<u32>>,

    /// Upper bound on inter-operation busy-wait cycles.
    #[arg(long, default_value_t = 0)]
    max_noise: u64,

    /// Redraw the noise bound per iteration instead of using a fixed one.
    #[arg(long)]
    random_noise: bool,

    /// Which bundled target to drive.
    #[arg(long, value_enum, default_value = "noop")]
    target: TargetKind,

    /// Output field delimiter for the text report. Ignored for `--format json`.
    #[arg(long, default_value_t = ';')]
    delimiter: char,

    /// Report format: `text` for the delimited line `csb` has always
    /// printed, `json` for a structured document of the same fields.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Run one target's full phased lifecycle and render the report in the
/// requested format. Generic so each match arm in `main` can instantiate a
/// different concrete `Target` without boxing it.
fn run_and_report<T: Target + 'static>(
    target: T,
    params: Parameters,
    format: OutputFormat,
    delimiter: char,
) -> Result<String, BmError> {
    let mut harness = Harness::new(target, params);
    harness.warmup()?;
    harness.run()?;
    let report = match format {
        OutputFormat::Text => harness.conclude(delimiter),
        OutputFormat::Json => {
            let report = harness.conclude_report();
            serde_json::to_string_pretty(&report).expect("report serialization cannot fail")
        }
    };
    harness.cooldown();
    Ok(report)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let op_count = match cli.target {
        TargetKind::Noop => 1,
        TargetKind::Latency => 1,
        TargetKind::Map => 3,
        TargetKind::Alternating => 1,
    };
    let weights = cli.weights.unwrap_or_else(|| default_weights(op_count));

    let params = Parameters {
        num_threads: cli.threads,
        duration_secs: cli.duration,
        initial_size: cli.initial_size,
        weights,
        max_noise: cli.max_noise,
        random_noise: cli.random_noise,
        connect_endpoint: None,
        bind_endpoint: None,
    };

    let result = match cli.target {
        TargetKind::Noop => run_and_report(NoopTarget::default(), params, cli.format, cli.delimiter),
        TargetKind::Latency => {
            run_and_report(LatencyTarget::new(LatencyConfig::default()), params, cli.format, cli.delimiter)
        }
        TargetKind::Map => run_and_report(ConcurrentMapTarget::new(), params, cli.format, cli.delimiter),
        TargetKind::Alternating => run_and_report(AlternatingTarget, params, cli.format, cli.delimiter),
    };

    match result {
        Ok(report) => println!("{report}"),
        Err(err) => {
            error!("benchmark failed: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

/// An even split across `op_count` buckets, with any remainder from
/// 1024 not dividing evenly folded into the first bucket.
fn default_weights(op_count: usize) -> Vec<u32> {
    let base = 1024 / op_count as u32;
    let remainder = 1024 - base * op_count as u32;
    let mut weights = vec![base; op_count];
    weights[0] += remainder;
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_1024() {
        for op_count in 1..=8 {
            let weights = default_weights(op_count);
            assert_eq!(weights.len(), op_count);
            assert_eq!(weights.iter().sum::<u32>(), 1024);
        }
    }
}
