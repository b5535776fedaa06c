//! Synthetic Identity Engine Benchmark
//!
//! Generates a batch from the built-in sample country and prints the first
//! record.

use std::sync::Arc;

use engine::persistence::to_display_document;
use engine::sample_data::{sample_data, sample_rules};
use engine::{GenerationRequest, IdentityGenerator};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Synthetic Identity Engine starting...");

    let rules = sample_rules();
    info!("Loaded rules for {}", rules.country);
    let generator = IdentityGenerator::new(rules, Arc::new(sample_data()))?;

    let count = 10_000;
    let seed = 2024;
    info!("Generating {} identities (seed {})...", count, seed);
    let start = std::time::Instant::now();
    let batch = generator.generate_batch(count, seed, &GenerationRequest::default())?;
    let elapsed = start.elapsed();

    info!(
        "Benchmark complete: {:?} total, {:?} per identity, {} failed",
        elapsed,
        elapsed / count as u32,
        batch.failures.len()
    );

    if let Some(first) = batch.identities.first() {
        for (key, value) in to_display_document(first, generator.rules())? {
            println!("{:<40} {}", key, value);
        }
    }

    Ok(())
}
