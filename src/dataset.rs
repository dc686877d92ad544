use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use tch::{Kind, Tensor};

/// Loads every image under `dir`, resized to `img_size`, as a
/// `[N, 3, img_size, img_size]` float tensor in `[-1, 1]`.
pub fn load(dir: &Path, img_size: i64) -> Result<Tensor> {
    if !dir.is_dir() {
        bail!("image directory {} does not exist", dir.display());
    }
    let images = tch::vision::image::load_dir(dir, img_size, img_size)
        .with_context(|| format!("loading images from {}", dir.display()))?;
    if images.size()[0] == 0 {
        bail!("no images found in {}", dir.display());
    }
    info!("Loaded Dataset: {images:?}");
    Ok(normalize(&images))
}

/// Rescales u8 pixels to `[-1, 1]` floats.
pub fn normalize(images: &Tensor) -> Tensor {
    images.to_kind(Kind::Float) / 127.5 - 1.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_pixel_range() {
        let pixels = Tensor::from_slice(&[0u8, 255]);
        let values = Vec::<f32>::try_from(normalize(&pixels)).unwrap();
        assert_eq!(values, vec![-1., 1.]);
    }

    #[test]
    fn loads_and_resizes_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..3 {
            let image = Tensor::full([3, 20, 20], 255i64, (Kind::Uint8, tch::Device::Cpu));
            tch::vision::image::save(&image, tmp.path().join(format!("{i}.png"))).unwrap();
        }
        let images = load(tmp.path(), 8).unwrap();
        assert_eq!(images.size(), vec![3, 3, 8, 8]);
        assert_eq!(images.kind(), Kind::Float);
        let max = f64::try_from(images.max()).unwrap();
        assert!((max - 1.).abs() < 1e-6);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load(&tmp.path().join("absent"), 8).is_err());
    }
}
