use tch::{Kind, Tensor};

/// Elementwise sigmoid cross-entropy on logits, in the form that stays
/// finite for large `|z|`: `max(z, 0) - z * t + ln(1 + exp(-|z|))`.
pub fn sigmoid_cross_entropy(logits: &Tensor, target: f64) -> Tensor {
    logits.clamp_min(0.) - logits * target + logits.abs().neg().exp().log1p()
}

pub fn discriminator_loss(real_logits: &Tensor, fake_logits: &Tensor) -> Tensor {
    sigmoid_cross_entropy(real_logits, 1.).mean(Kind::Float)
        + sigmoid_cross_entropy(fake_logits, 0.).mean(Kind::Float)
}

pub fn generator_loss(fake_logits: &Tensor) -> Tensor {
    sigmoid_cross_entropy(fake_logits, 1.).mean(Kind::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(t: &Tensor) -> Vec<f64> {
        Vec::<f64>::try_from(t.to_kind(Kind::Double)).unwrap()
    }

    #[test]
    fn finite_for_extreme_logits() {
        let logits = Tensor::from_slice(&[-1e6f32, 0., 1e6]);
        for target in [0., 1.] {
            let loss = values(&sigmoid_cross_entropy(&logits, target));
            assert!(loss.iter().all(|v| v.is_finite()), "{loss:?}");
        }
        let close = |got: Vec<f64>, want: [f64; 3]| {
            got.iter().zip(want).all(|(g, w)| (g - w).abs() < 1e-6)
        };
        assert!(close(values(&sigmoid_cross_entropy(&logits, 1.)), [1e6, 2f64.ln(), 0.]));
        assert!(close(values(&sigmoid_cross_entropy(&logits, 0.)), [0., 2f64.ln(), 1e6]));
    }

    #[test]
    fn matches_naive_form_for_moderate_logits() {
        let logits = Tensor::from_slice(&[-3f64, -0.5, 0.25, 2.]);
        for target in [0f64, 1.] {
            let naive = values(&(-(target * logits.sigmoid().log()
                + (1. - target) * (1f64 - logits.sigmoid()).log())));
            let stable = values(&sigmoid_cross_entropy(&logits, target));
            for (a, b) in naive.iter().zip(stable.iter()) {
                assert!((a - b).abs() < 1e-9, "{a} != {b}");
            }
        }
    }

    #[test]
    fn losses_are_means_over_the_batch() {
        let zeros = Tensor::zeros([4], (Kind::Float, tch::Device::Cpu));
        let d_loss = f64::try_from(discriminator_loss(&zeros, &zeros)).unwrap();
        let g_loss = f64::try_from(generator_loss(&zeros)).unwrap();
        assert!((d_loss - 2. * 2f64.ln()).abs() < 1e-6);
        assert!((g_loss - 2f64.ln()).abs() < 1e-6);

        let confident_real = Tensor::from_slice(&[50f32, 50.]);
        let confident_fake = Tensor::from_slice(&[-50f32, -50., -50.]);
        let d_loss = f64::try_from(discriminator_loss(&confident_real, &confident_fake)).unwrap();
        let g_loss = f64::try_from(generator_loss(&confident_fake)).unwrap();
        assert!(d_loss < 1e-6);
        assert!((g_loss - 50.).abs() < 1e-4);
    }
}
