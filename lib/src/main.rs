use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use osd_transfer::config::TransferConfig;
use osd_transfer::dataset::aggregate::aggregate_file;
use osd_transfer::dataset::{CsvRowSource, Strain};
use osd_transfer::pipeline::TransferPipeline;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Baseline used when `train` is given no `--predict` value.
const DEFAULT_BASELINE: f64 = 9.352293386;

#[derive(Parser, Debug)]
#[command(name = "osd-transfer", version, about = "Baseline-to-timepoint expression regression")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on one strain's processed table, report test error and predict.
    Train {
        /// Processed per-strain CSV.
        #[arg(long)]
        csv: PathBuf,
        /// c3h_hej or c57_6j.
        #[arg(long)]
        strain: String,
        /// JSON run settings; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Raw baselines to predict after training.
        #[arg(long, num_args = 1..)]
        predict: Vec<f64>,
        /// Write the per-epoch loss trace here as CSV.
        #[arg(long)]
        trace_out: Option<PathBuf>,
    },
    /// Average replicate columns of a raw table into one CSV per strain.
    Aggregate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Write the default run settings to a JSON file.
    InitConfig { path: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Train {
            csv,
            strain,
            config,
            predict,
            trace_out,
        } => train(csv, &strain, config, predict, trace_out),
        Command::Aggregate { input, out_dir } => {
            let written = aggregate_file(&input, &out_dir)
                .with_context(|| format!("aggregating {}", input.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::InitConfig { path } => {
            TransferConfig::default()
                .dump(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(())
        }
    }
}

fn train(
    csv: PathBuf,
    strain: &str,
    config: Option<PathBuf>,
    predict: Vec<f64>,
    trace_out: Option<PathBuf>,
) -> Result<()> {
    let Some(strain) = Strain::from_name(strain) else {
        bail!("unknown strain {:?}, expected one of c3h_hej, c57_6j", strain);
    };
    let config = match config {
        Some(path) => TransferConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TransferConfig::default(),
    };

    info!(%strain, csv = %csv.display(), "training");
    let source = CsvRowSource::new(&csv).with_strain(strain);
    let outcome = TransferPipeline::new(config)?
        .run_source(&source)
        .with_context(|| format!("training on {}", csv.display()))?;

    if let Some(path) = trace_out {
        outcome
            .trace
            .save_csv(&path)
            .with_context(|| format!("writing trace {}", path.display()))?;
    }

    println!("test_mse\t{:.6}", outcome.test_mse);
    let baselines = if predict.is_empty() {
        vec![DEFAULT_BASELINE]
    } else {
        predict
    };
    for (baseline, prediction) in baselines
        .iter()
        .zip(outcome.predictor.predict_many(&baselines)?)
    {
        println!("baseline\t{}", baseline);
        for (column, value) in prediction.iter() {
            println!("  {}\t{:.6}", column, value);
        }
    }
    Ok(())
}
