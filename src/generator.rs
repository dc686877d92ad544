use tch::{nn, Tensor};

use crate::config::NetConfig;

#[derive(Debug)]
pub struct Generator {
    net: nn::SequentialT
}

impl Generator {
    /// Upsamples `[B, dim_latent, 1, 1]` to `[B, 3, img_size, img_size]`,
    /// halving the channel depth at every stride-2 stage.
    pub fn new(path: nn::Path, config: &NetConfig) -> Generator {
            let mut dim_hidden = config.gen_hidden;
            let mut net = nn::seq_t()
                .add(nn::conv_transpose2d(&path / "ConvTranspose2d_0", config.dim_latent, dim_hidden,
                                            4, nn::ConvTransposeConfig { stride: 1, padding: 0, dilation: 1, ..Default::default() }))
                .add(nn::batch_norm2d(&path / "batch_norm2d_0", dim_hidden, config.batch_norm()))
                .add_fn(|x| x.relu());
            let stages = config.stages();
            for i in 1..=stages {
                let dim_out = if i == stages { 3 } else { dim_hidden / 2 };
                net = net
                    .add(nn::conv_transpose2d(&path / format!("ConvTranspose2d_{i}"), dim_hidden, dim_out,
                                                4, nn::ConvTransposeConfig { stride: 2, padding: 1, dilation: 1, ..Default::default() }))
                    .add(nn::batch_norm2d(&path / format!("batch_norm2d_{i}"), dim_out, config.batch_norm()));
                net = if i == stages { net.add_fn(|x| x.tanh()) } else { net.add_fn(|x| x.relu()) };
                dim_hidden = dim_out;
            }
            Generator { net }
        }
}

impl nn::ModuleT for Generator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
            self.net.forward_t(&xs, train)
        }
}
