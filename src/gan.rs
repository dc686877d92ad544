use tch::{nn, Device};

use crate::config::NetConfig;
use crate::discriminator::Discriminator;
use crate::generator::Generator;

/// All trainable state of the GAN. Owned by the trainer; the networks only
/// hold handles to variables living in these stores.
pub struct ParamStore {
    pub generator: nn::VarStore,
    pub discriminator: nn::VarStore,
}

impl ParamStore {
    pub fn new(device: Device) -> ParamStore {
        ParamStore {
            generator: nn::VarStore::new(device),
            discriminator: nn::VarStore::new(device),
        }
    }

    pub fn device(&self) -> Device {
        self.generator.device()
    }

    /// Only the discriminator's variables receive gradients.
    pub fn train_discriminator(&mut self) {
        self.discriminator.unfreeze();
        self.generator.freeze();
    }

    /// Only the generator's variables receive gradients.
    pub fn train_generator(&mut self) {
        self.discriminator.freeze();
        self.generator.unfreeze();
    }
}

#[derive(Debug)]
pub struct Gan {
    pub generator: Generator,
    pub discriminator: Discriminator,
}

impl Gan {
    pub fn new(params: &ParamStore, config: &NetConfig) -> Gan {
        Gan {
            generator: Generator::new(params.generator.root(), config),
            discriminator: Discriminator::new(params.discriminator.root(), config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freezing_switches_between_networks() {
        let config = NetConfig { img_size: 8, dim_latent: 4, gen_hidden: 8, dis_hidden: 4, eps: 1e-5 };
        let mut params = ParamStore::new(Device::Cpu);
        let _gan = Gan::new(&params, &config);
        assert!(!params.generator.trainable_variables().is_empty());
        assert!(!params.discriminator.trainable_variables().is_empty());

        params.train_discriminator();
        assert!(params.discriminator.trainable_variables().iter().all(|v| v.requires_grad()));
        assert!(params.generator.trainable_variables().iter().all(|v| !v.requires_grad()));

        params.train_generator();
        assert!(params.discriminator.trainable_variables().iter().all(|v| !v.requires_grad()));
        assert!(params.generator.trainable_variables().iter().all(|v| v.requires_grad()));
    }
}
