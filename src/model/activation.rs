//! Swish activation.

use tch::{nn, Tensor};

/// `x * sigmoid(x)`, element-wise.
pub fn swish(xs: &Tensor) -> Tensor {
    xs * xs.sigmoid()
}

/// Swish as a layer, so it can sit inside an `nn::Sequential`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Swish;

impl Swish {
    pub fn new() -> Self {
        Self
    }
}

impl nn::Module for Swish {
    fn forward(&self, xs: &Tensor) -> Tensor {
        swish(xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::nn::Module;

    #[test]
    fn test_swish_values() {
        let xs = Tensor::from_slice(&[0.0f32, 1.0, -1.0, 10.0]);
        let ys = Vec::<f32>::try_from(&Swish::new().forward(&xs)).unwrap();

        let sigmoid = |x: f32| 1.0 / (1.0 + (-x).exp());
        assert!(ys[0].abs() < 1e-6);
        assert!((ys[1] - sigmoid(1.0)).abs() < 1e-5);
        assert!((ys[2] + sigmoid(-1.0)).abs() < 1e-5);
        // Approaches identity for large inputs
        assert!((ys[3] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_swish_keeps_shape() {
        let xs = Tensor::zeros([2, 3, 4], (tch::Kind::Float, tch::Device::Cpu));
        assert_eq!(swish(&xs).size(), vec![2, 3, 4]);
    }
}
