use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use tch::nn;

use crate::schedule::{Cadence, Schedule};

#[derive(Parser, Debug)]
#[command(version, about = "Face GAN training via Rust.", long_about = None)]
pub struct Args {
    /// Image directory; takes precedence over --img-path.
    pub dataset: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Variant::Face32)]
    pub variant: Variant,
    #[arg(long, default_value = "/tmp/celeba-128")]
    pub img_path: PathBuf,
    #[arg(long)]
    pub batch_size: Option<i64>,
    /// Train the networks, or sample from the final generator weights.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub train: bool,
    /// Batch normalization epsilon.
    #[arg(long, default_value_t = 1e-5)]
    pub eps: f64,
    /// Last epoch before the loop converges.
    #[arg(short, long)]
    pub epochs: Option<i64>,
    #[arg(long, default_value_t = 10)]
    pub checkpoint_every: i64,
    #[arg(long, value_enum, default_value_t = CadenceRule::EveryN)]
    pub cadence: CadenceRule,
    #[arg(long)]
    pub lr: Option<f64>,
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,
    #[arg(long, default_value = "debug")]
    pub log_dir: PathBuf,
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
    #[arg(short, long, default_value_t = 16)]
    pub samples: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Face32,
    Face128,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CadenceRule {
    /// Epoch 1 and every multiple of the period.
    EveryN,
    /// Every epoch that is not a multiple of the period, plus epoch 1.
    NonMultiples,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptimizerKind {
    Adam { beta1: f64, beta2: f64 },
    RmsProp { alpha: f64, eps: f64 },
}

impl OptimizerKind {
    pub fn build(&self, vs: &nn::VarStore, lr: f64) -> Result<nn::Optimizer> {
        use nn::OptimizerConfig;
        let optimizer = match *self {
            OptimizerKind::Adam { beta1, beta2 } => nn::adam(beta1, beta2, 0.).build(vs, lr)?,
            OptimizerKind::RmsProp { alpha, eps } => {
                nn::rms_prop(alpha, eps, 0., 0., false).build(vs, lr)?
            }
        };
        Ok(optimizer)
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Adam { beta1, beta2 } => write!(f, "Adam(beta1={beta1}, beta2={beta2})"),
            OptimizerKind::RmsProp { alpha, eps } => write!(f, "RMSProp(alpha={alpha}, eps={eps})"),
        }
    }
}

/// Shape of both networks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetConfig {
    pub img_size: i64,
    pub dim_latent: i64,
    /// Channels of the generator's first (4x4) stage.
    pub gen_hidden: i64,
    /// Channels of the discriminator's first stage.
    pub dis_hidden: i64,
    pub eps: f64,
}

impl NetConfig {
    /// Number of stride-2 stages between 4x4 and the image size.
    pub fn stages(&self) -> i64 {
        (self.img_size / 4).trailing_zeros() as i64
    }

    pub fn batch_norm(&self) -> nn::BatchNormConfig {
        nn::BatchNormConfig { eps: self.eps, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.img_size / 4;
        if self.img_size < 8 || self.img_size % 4 != 0 || ratio & (ratio - 1) != 0 {
            bail!("image size must be 4 * 2^k with k >= 1, got {}", self.img_size);
        }
        if self.dim_latent <= 0 || self.gen_hidden <= 0 || self.dis_hidden <= 0 {
            bail!("network widths must be positive");
        }
        if self.gen_hidden >> self.stages() < 1 {
            bail!(
                "generator width {} cannot be halved {} times",
                self.gen_hidden,
                self.stages()
            );
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TrainConfig {
    pub net: NetConfig,
    pub batch_size: i64,
    pub lr: f64,
    pub optimizer: OptimizerKind,
    pub schedule: Schedule,
    pub dataset: PathBuf,
    pub model_dir: PathBuf,
    pub log_dir: PathBuf,
    pub results_dir: PathBuf,
    pub samples: usize,
}

impl Variant {
    pub fn net(&self, eps: f64) -> NetConfig {
        match self {
            Variant::Face32 => NetConfig { img_size: 32, dim_latent: 128, gen_hidden: 512, dis_hidden: 64, eps },
            Variant::Face128 => NetConfig { img_size: 128, dim_latent: 128, gen_hidden: 1024, dis_hidden: 64, eps },
        }
    }

    pub fn batch_size(&self) -> i64 {
        match self {
            Variant::Face32 => 100,
            Variant::Face128 => 32,
        }
    }

    pub fn threshold(&self) -> i64 {
        match self {
            Variant::Face32 => 1000,
            Variant::Face128 => 400,
        }
    }

    pub fn optimizer(&self) -> (OptimizerKind, f64) {
        match self {
            Variant::Face32 => (OptimizerKind::RmsProp { alpha: 0.9, eps: 1e-10 }, 5e-3),
            Variant::Face128 => (OptimizerKind::Adam { beta1: 0.5, beta2: 0.999 }, 2e-4),
        }
    }
}

impl TrainConfig {
    pub fn from_args(args: Args) -> Result<TrainConfig> {
        let variant = args.variant;
        let net = variant.net(args.eps);
        net.validate()?;

        let batch_size = args.batch_size.unwrap_or_else(|| variant.batch_size());
        if batch_size <= 0 {
            bail!("batch size must be positive, got {batch_size}");
        }
        let threshold = args.epochs.unwrap_or_else(|| variant.threshold());
        if threshold <= 0 {
            bail!("epoch threshold must be positive, got {threshold}");
        }
        if args.checkpoint_every <= 0 {
            bail!("checkpoint period must be positive, got {}", args.checkpoint_every);
        }
        if args.eps <= 0. {
            bail!("eps must be positive, got {}", args.eps);
        }

        let cadence = match args.cadence {
            CadenceRule::EveryN => Cadence::EveryN(args.checkpoint_every),
            CadenceRule::NonMultiples => Cadence::NonMultiples(args.checkpoint_every),
        };
        let (optimizer, default_lr) = variant.optimizer();

        Ok(TrainConfig {
            net,
            batch_size,
            lr: args.lr.unwrap_or(default_lr),
            optimizer,
            schedule: Schedule { threshold, cadence },
            dataset: args.dataset.unwrap_or(args.img_path),
            model_dir: args.model_dir,
            log_dir: args.log_dir,
            results_dir: args.results_dir,
            samples: args.samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("facegan-rs").chain(argv.iter().copied()))
    }

    #[test]
    fn variant_defaults_fill_missing_flags() {
        let config = TrainConfig::from_args(parse(&["--variant", "face128"])).unwrap();
        assert_eq!(config.net.img_size, 128);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.schedule.threshold, 400);
        assert_eq!(config.schedule.cadence, Cadence::EveryN(10));
        assert_eq!(config.dataset, PathBuf::from("/tmp/celeba-128"));

        let config = TrainConfig::from_args(parse(&[])).unwrap();
        assert_eq!(config.net.img_size, 32);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.schedule.threshold, 1000);
        assert!(matches!(config.optimizer, OptimizerKind::RmsProp { .. }));
        assert_eq!(config.lr, 5e-3);
    }

    #[test]
    fn positional_dataset_overrides_img_path() {
        let config =
            TrainConfig::from_args(parse(&["--img-path", "/a", "/data/faces"])).unwrap();
        assert_eq!(config.dataset, PathBuf::from("/data/faces"));
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--batch-size", "8", "--epochs", "3", "--cadence", "non-multiples",
            "--checkpoint-every", "5", "--lr", "0.1", "--eps", "0.001", "--train", "false",
        ]);
        assert!(!args.train);
        let config = TrainConfig::from_args(args).unwrap();
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.schedule, Schedule { threshold: 3, cadence: Cadence::NonMultiples(5) });
        assert_eq!(config.lr, 0.1);
        assert_eq!(config.net.eps, 0.001);
    }

    #[test]
    fn rejects_non_positive_values() {
        assert!(TrainConfig::from_args(parse(&["--batch-size", "0"])).is_err());
        assert!(TrainConfig::from_args(parse(&["--epochs", "0"])).is_err());
        assert!(TrainConfig::from_args(parse(&["--checkpoint-every", "0"])).is_err());
    }

    #[test]
    fn image_size_must_be_power_of_two_multiple_of_four() {
        let mut net = Variant::Face32.net(1e-5);
        assert_eq!(net.stages(), 3);
        assert!(net.validate().is_ok());
        net.img_size = 48;
        assert!(net.validate().is_err());
        net.img_size = 4;
        assert!(net.validate().is_err());
        assert_eq!(Variant::Face128.net(1e-5).stages(), 5);
    }
}
