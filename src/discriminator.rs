use tch::{nn, Tensor};

use crate::config::NetConfig;

/// Scores images with one unbounded logit each. The same value is applied to
/// real and generated batches, so both are scored by one set of variables.
#[derive(Debug)]
pub struct Discriminator {
    net: nn::SequentialT
}

impl Discriminator {
    pub fn new(path: nn::Path, config: &NetConfig) -> Discriminator {
            let mut dim_in = 3;
            let mut dim_hidden = config.dis_hidden;
            let mut net = nn::seq_t();
            for i in 1..=config.stages() {
                net = net
                    .add(nn::conv2d(&path / format!("Conv2d_{i}"), dim_in, dim_hidden,
                                                4, nn::ConvConfig { stride: 2, padding: 1, ..Default::default() }))
                    .add(nn::batch_norm2d(&path / format!("batch_norm2d_{i}"), dim_hidden, config.batch_norm()))
                    .add_fn(|x| x.leaky_relu());
                dim_in = dim_hidden;
                dim_hidden *= 2;
            }
            let net = net
                .add_fn(|x| x.flatten(1, -1))
                .add(nn::linear(&path / "Linear", dim_in * 4 * 4, 1, Default::default()))
                .add_fn(|x| x.squeeze_dim(-1));
            Discriminator { net }
        }
}

impl nn::ModuleT for Discriminator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
            self.net.forward_t(&xs, train)
        }
}
