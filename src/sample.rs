use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use gif::{Encoder, Frame, Repeat};
use tch::{Device, Kind, Tensor};

use crate::config::NetConfig;
use crate::generator::Generator;

const MORPHING_FRAMES: i64 = 100;

/// Maps tanh output in `[-1, 1]` to u8 pixels.
fn to_pixels(images: &Tensor) -> Tensor {
    ((images + 1.) * 127.5).clamp(0., 255.).to_kind(Kind::Uint8).to_device(Device::Cpu)
}

fn seed(config: &NetConfig, device: Device) -> Tensor {
    Tensor::randn([1, config.dim_latent, 1, 1], (Kind::Float, device))
}

/// Writes `num` independent samples as `generate-<i>.png`.
pub fn generate(generator: &Generator, config: &NetConfig, num: usize, dir: &Path, device: Device) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for i in 0..num {
        let image = seed(config, device)
            .apply_t(generator, false)
            .squeeze_dim(0);
        tch::vision::image::save(&to_pixels(&image), dir.join(format!("generate-{}.png", i+1)))?;
    }
    Ok(())
}

/// Writes `morphing.gif`: a linear walk between two random latents.
pub fn morphing(generator: &Generator, config: &NetConfig, dir: &Path, device: Device) -> Result<()> {
    let seed_one = seed(config, device);
    let seed_two = seed(config, device);
    let img_size = config.img_size as u16;
    let frame_len = 3 * config.img_size as usize * config.img_size as usize;

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut image = File::create(dir.join("morphing.gif"))?;
    let mut encoder = Encoder::new(&mut image, img_size, img_size, &[])?;
    encoder.set_repeat(Repeat::Infinite)?;

    for i in 0..MORPHING_FRAMES {
        let l: f64 = i as f64 / (MORPHING_FRAMES - 1) as f64;
        let image = ((1.0 - l) * &seed_one + l * &seed_two)
            .apply_t(generator, false)
            .squeeze_dim(0).permute_copy([1,2,0]).flatten(0, -1);
        let mut data = vec![0u8; frame_len];
        to_pixels(&image).copy_data(&mut data, frame_len);
        let frame = Frame::from_rgb(img_size, img_size, &data);
        encoder.write_frame(&frame)?;
    }
    Ok(())
}
