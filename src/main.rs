use anyhow::{Context, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use snr_bam::cli::Args;
use snr_bam::pipeline;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let jobs = args.jobs()?;
    let options = args.convert_options();

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("failed to create output directory {}", args.outdir.display()))?;

    for (input, prefix) in &jobs {
        let start = Instant::now();
        tracing::info!(input = %input.display(), "{prefix}: converting");
        pipeline::convert_file(input, prefix, &args.outdir, &options)?;
        tracing::info!(
            seconds = %format!("{:.2}", start.elapsed().as_secs_f64()),
            "{prefix} done!"
        );
    }

    tracing::info!(files = jobs.len(), "Finished!");
    Ok(())
}
