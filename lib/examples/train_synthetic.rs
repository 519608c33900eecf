//! End-to-end run on a synthetic strain table.
//!
//! Builds a replicate table in memory, averages it into per-strain samples,
//! trains the transfer network on one strain and predicts the six downstream
//! readings for a new baseline.
//!
//! Run with: cargo run --example train_synthetic

use osd_transfer::{
    config::TransferConfig,
    dataset::{
        aggregate::{average_replicates, ReplicateTable},
        Strain,
    },
    pipeline::TransferPipeline,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::error::Error;

const GENES: usize = 60;
const REPLICATES: usize = 3;
const STRAINS: [&str; 2] = ["C3H-HeJ", "C57-6J"];
const CONDITIONS: [&str; 7] = [
    "BSL_0days",
    "FLT_25days",
    "FLT_75days",
    "GC_25days",
    "GC_75days",
    "VIV_25days",
    "VIV_75days",
];

/// Raw headers follow `RR10_<strain>_M<mouse>_<condition>_<timepoint>`.
fn synthetic_table(rng: &mut StdRng) -> Result<ReplicateTable, Box<dyn Error>> {
    let mut header = vec!["ENSEMBL".to_string()];
    for strain in STRAINS {
        for condition in CONDITIONS {
            for mouse in 1..=REPLICATES {
                header.push(format!("RR10_{}_M{}_{}", strain, mouse, condition));
            }
        }
    }

    let mut csv = header.join(",");
    csv.push('\n');
    for gene in 0..GENES {
        let level: f64 = rng.gen_range(4.0..14.0);
        let mut row = vec![format!("ENSMUSG{:011}", gene)];
        for _ in STRAINS {
            for (c, _) in CONDITIONS.iter().enumerate() {
                // flight conditions drift upwards, controls stay near baseline
                let shift = if (1..=2).contains(&c) { 0.4 * c as f64 } else { 0.0 };
                for _ in 0..REPLICATES {
                    row.push(format!("{:.4}", level + shift + rng.gen_range(-0.2..0.2)));
                }
            }
        }
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    Ok(average_replicates(csv.as_bytes())?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(2024);
    let table = synthetic_table(&mut rng)?;
    println!("Aggregated {} genes", table.len());

    let config = TransferConfig {
        epochs: 300,
        verbose: false,
        ..TransferConfig::default()
    };
    let pipeline = TransferPipeline::new(config)?;

    for strain in Strain::ALL {
        let outcome = pipeline.run_source(&table.row_source(strain))?;
        let (first, last) = match (outcome.trace.first(), outcome.trace.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err("empty loss trace".into()),
        };
        println!("\n=== {} ===", strain);
        println!(
            "train loss {:.4} -> {:.4}, validation loss {:.4} -> {:.4}",
            first.train_loss, last.train_loss, first.validation_loss, last.validation_loss
        );
        println!("test MSE (scaled): {:.4}", outcome.test_mse);
        for t in &outcome.per_target_mse {
            println!("  {:<16} {:.4}", t.target.column_name(), t.mse);
        }

        let prediction = outcome.predictor.predict(9.352293386)?;
        println!("Prediction for baseline 9.352293386:");
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    }

    Ok(())
}
