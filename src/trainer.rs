use anyhow::{Context, Result};
use log::{debug, info};
use tch::{nn, Device, Kind, Tensor};
use tqdm::tqdm;

use crate::batch;
use crate::checkpoint::{CheckpointStore, CheckpointTag};
use crate::config::TrainConfig;
use crate::gan::{Gan, ParamStore};
use crate::loss;
use crate::schedule::Phase;
use crate::summary::{SummarySink, DISCRIMINATOR_LOSS, GENERATOR_LOSS};

/// Mean losses of one pass over the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: i64,
    pub batches: usize,
    pub generator_loss: f64,
    pub discriminator_loss: f64,
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub struct Trainer {
    config: TrainConfig,
    params: ParamStore,
    gan: Gan,
    optimizer_g: nn::Optimizer,
    optimizer_d: nn::Optimizer,
}

impl Trainer {
    pub fn new(config: TrainConfig, device: Device) -> Result<Trainer> {
        let params = ParamStore::new(device);
        let gan = Gan::new(&params, &config.net);
        let optimizer_g = config.optimizer.build(&params.generator, config.lr)?;
        let optimizer_d = config.optimizer.build(&params.discriminator, config.lr)?;
        Ok(Trainer { config, params, gan, optimizer_g, optimizer_d })
    }

    /// One discriminator step then one generator step per contiguous batch.
    pub fn train_epoch(&mut self, dataset: &Tensor, epoch: i64) -> Result<EpochSummary> {
        let device = self.params.device();
        let train_size = dataset.size()[0];
        let mut g_losses = Vec::new();
        let mut d_losses = Vec::new();

        for (start, len) in tqdm(batch::partition(train_size, self.config.batch_size)) {
            let real = dataset.narrow(0, start, len).to_device(device);
            let latent = Tensor::randn([len, self.config.net.dim_latent, 1, 1], (Kind::Float, device));

            // Train Discriminator
            self.params.train_discriminator();
            let d_loss = {
                let real_logits = real.apply_t(&self.gan.discriminator, true);
                let fake_logits = latent
                    .apply_t(&self.gan.generator, true)
                    .detach()
                    .apply_t(&self.gan.discriminator, true);
                loss::discriminator_loss(&real_logits, &fake_logits)
            };
            self.optimizer_d.backward_step(&d_loss);

            // Train Generator
            self.params.train_generator();
            let g_loss = {
                let fake_logits = latent
                    .apply_t(&self.gan.generator, true)
                    .apply_t(&self.gan.discriminator, true);
                loss::generator_loss(&fake_logits)
            };
            self.optimizer_g.backward_step(&g_loss);

            let g_loss = f64::try_from(&g_loss)?;
            let d_loss = f64::try_from(&d_loss)?;
            debug!("epoch {epoch} batch @{start}+{len}: G_LOSS({g_loss}) D_LOSS({d_loss})");
            g_losses.push(g_loss);
            d_losses.push(d_loss);
        }

        Ok(EpochSummary {
            epoch,
            batches: g_losses.len(),
            generator_loss: mean(&g_losses),
            discriminator_loss: mean(&d_losses),
        })
    }

    /// Runs epochs until the schedule converges, writing cadence checkpoints
    /// and summaries along the way and the final weights once at the end.
    pub fn run<C, S>(&mut self, dataset: &Tensor, store: &mut C, sink: &mut S) -> Result<EpochSummary>
    where
        C: CheckpointStore,
        S: SummarySink,
    {
        let schedule = self.config.schedule;
        let mut last: Option<EpochSummary> = None;
        let mut phase = Phase::Initializing;
        loop {
            match phase {
                Phase::Initializing => {
                    info!(
                        "Initialized: {} generator + {} discriminator variables",
                        self.params.generator.len(),
                        self.params.discriminator.len()
                    );
                }
                Phase::EpochRunning(epoch) => {
                    let summary = self.train_epoch(dataset, epoch)?;
                    info!(
                        "Epoch {epoch}: G_LOSS({:.6}) D_LOSS({:.6})",
                        summary.generator_loss, summary.discriminator_loss
                    );
                    last = Some(summary);
                }
                Phase::Checkpointing(epoch) => {
                    if let Some(summary) = &last {
                        sink.add_scalar(DISCRIMINATOR_LOSS, summary.discriminator_loss, epoch)?;
                        sink.add_scalar(GENERATOR_LOSS, summary.generator_loss, epoch)?;
                    }
                    store.save(&self.params, CheckpointTag::Epoch(epoch))?;
                }
                Phase::Converged(epoch) => {
                    store.save(&self.params, CheckpointTag::Final)?;
                    info!("Fully trained after epoch {epoch}");
                    return last.context("training stopped before the first epoch");
                }
            }
            phase = schedule.next(phase);
        }
    }
}
