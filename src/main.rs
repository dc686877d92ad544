use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tch::{nn, Device};

mod batch;
mod checkpoint;
mod config;
mod dataset;
mod discriminator;
mod gan;
mod generator;
mod loss;
mod sample;
mod schedule;
mod summary;
mod trainer;

use checkpoint::{DirCheckpointStore, FINAL_GENERATOR};
use config::{Args, TrainConfig};
use generator::Generator;
use summary::JsonlSummaryWriter;
use trainer::Trainer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let train = args.train;
    let config = TrainConfig::from_args(args)?;

    let device = Device::cuda_if_available();
    info!("Use Device: {device:?}");

    if !train {
        return run_sampling(&config, device);
    }

    info!("Image Dataset Dir: {}", config.dataset.display());
    info!("Image Size: {}", config.net.img_size);
    info!("Dim Latent: {}", config.net.dim_latent);
    info!("Batch Size: {}", config.batch_size);
    info!("Optimizer: {} lr={}", config.optimizer, config.lr);
    info!("Batch Norm Eps: {}", config.net.eps);
    info!("Epoch Threshold: {}", config.schedule.threshold);
    info!("Checkpoint Cadence: {:?}", config.schedule.cadence);

    info!("Loading Dataset...");
    let dataset = dataset::load(&config.dataset, config.net.img_size)?;

    let mut store = DirCheckpointStore::new(&config.model_dir)?;
    let mut sink = JsonlSummaryWriter::new(&config.log_dir)?;
    info!("Checkpoints: {} Summaries: {}", store.dir().display(), config.log_dir.display());
    let mut trainer = Trainer::new(config, device)?;
    let last = trainer.run(&dataset, &mut store, &mut sink)?;
    info!(
        "Done: epoch {} ({} batches) G_LOSS({:.6}) D_LOSS({:.6})",
        last.epoch, last.batches, last.generator_loss, last.discriminator_loss
    );
    Ok(())
}

/// Loads the final generator weights and writes samples plus a morphing gif.
fn run_sampling(config: &TrainConfig, device: Device) -> Result<()> {
    let mut g_vs = nn::VarStore::new(device);
    let generator = Generator::new(g_vs.root(), &config.net);
    let path = config.model_dir.join(FINAL_GENERATOR);
    g_vs.load(&path).with_context(|| format!("loading {}", path.display()))?;
    info!("Loaded: {}", path.display());

    sample::generate(&generator, &config.net, config.samples, &config.results_dir, device)?;
    info!("Generated {} samples in {}", config.samples, config.results_dir.display());
    sample::morphing(&generator, &config.net, &config.results_dir, device)?;
    info!("Generated morphing.gif");
    Ok(())
}
