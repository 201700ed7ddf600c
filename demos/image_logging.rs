//! Image Logging Example
//!
//! Simulates a training loop that logs a loss curve and a reservoir-sampled
//! subset of each step's input images, persists the run to Parquet, and reads
//! it back the way a dashboard would.
//!
//! Run with: cargo run --example image_logging

use tracing_subscriber::EnvFilter;
use trueno_vislog::image::ImageConfig;
use trueno_vislog::{LogReader, LogWriter};

const STEPS: u64 = 12;
const BATCH: u8 = 64;

#[allow(clippy::cast_precision_loss)]
fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trueno_vislog=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== trueno-vislog Image Logging ===\n");

    let run_dir = tempfile::tempdir()?;
    let writer = LogWriter::builder()
        .mode("train")
        .persist_dir(run_dir.path())
        .build()?;

    // -------------------------------------------------------------------------
    // 1. Log a training run
    // -------------------------------------------------------------------------
    println!("1. Logging {STEPS} steps of {BATCH} images...");

    let loss = writer.new_scalar::<f32>("loss")?;
    let config = ImageConfig {
        num_samples: 4,
        sample_period: 3,
        seed: Some(2024),
        ..ImageConfig::default()
    };
    let mut inputs = writer.new_image("conv1/input", &config)?;

    for step in 0..STEPS {
        loss.add_record(step, 2.0 / (step as f32 + 1.0))?;

        inputs.start_step(step)?;
        for item in 0..BATCH {
            // Only kept samples are materialized
            if let Some(slot) = inputs.offer().slot() {
                let image: Vec<u8> = (0..8 * 8).map(|px: u8| px.wrapping_add(item)).collect();
                inputs.set_sample(slot, &[8, 8], &image)?;
            }
        }
        let next = inputs.finish_step()?;
        if step % 3 == 0 {
            println!("   step {step:>2} sampled, next step {next}");
        }
    }
    writer.persist()?;

    // -------------------------------------------------------------------------
    // 2. Read the run back
    // -------------------------------------------------------------------------
    println!("\n2. Reading run from {}...", run_dir.path().display());

    let reader = LogReader::open(run_dir.path(), "train")?;
    println!("   Series: {:?}", reader.tags());

    let loss = reader.scalar::<f32>("loss");
    for (id, value) in loss.ids()?.iter().zip(loss.records()?) {
        println!("   loss[{id:>2}] = {value:.4}");
    }

    let images = reader.image("conv1/input");
    println!("\n   Caption: {}", images.caption()?);
    for offset in 0..images.size() {
        let samples = images.samples(offset)?;
        let firsts: Vec<u8> = samples.iter().map(|s| s.data[0]).collect();
        println!(
            "   step {:>2}: {} samples kept, batch items {firsts:?}",
            samples[0].step_id,
            samples.len()
        );
    }

    println!("\n=== Done ===");
    Ok(())
}
