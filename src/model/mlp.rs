//! Fully connected denoiser over flattened inputs.

use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, Kind, Tensor};
use tracing::debug;

use super::activation::Swish;
use super::backbone::{Backbone, BackboneKind};
use crate::error::{ensure_positive, Error, Result};

/// Configuration for an [`Mlp`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MlpConfig {
    /// Width of one input row
    pub input_dim: i64,
    /// Width of the time signal appended to each row
    pub time_dim: i64,
    /// Hidden layer width
    pub hidden_dim: i64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            input_dim: 2,
            time_dim: 1,
            hidden_dim: 128,
        }
    }
}

/// MLP denoiser
///
/// Architecture:
/// 1. Linear(input_dim + time_dim -> hidden_dim) + Swish
/// 2. Three Linear(hidden_dim -> hidden_dim) + Swish blocks
/// 3. Linear(hidden_dim -> input_dim)
#[derive(Debug)]
pub struct Mlp {
    main: nn::Sequential,
    config: MlpConfig,
}

const NUM_HIDDEN_BLOCKS: usize = 3;

impl Mlp {
    /// Create a new MLP under `vs`
    pub fn new(vs: &nn::Path, config: MlpConfig) -> Result<Self> {
        ensure_positive(&[
            ("input_dim", config.input_dim),
            ("time_dim", config.time_dim),
            ("hidden_dim", config.hidden_dim),
        ])?;

        let hidden = config.hidden_dim;
        let mut main = nn::seq()
            .add(nn::linear(
                vs / "input",
                config.input_dim + config.time_dim,
                hidden,
                Default::default(),
            ))
            .add(Swish);

        for i in 0..NUM_HIDDEN_BLOCKS {
            main = main
                .add(nn::linear(vs / format!("hidden_{}", i), hidden, hidden, Default::default()))
                .add(Swish);
        }

        let output = nn::linear(vs / "output", hidden, config.input_dim, Default::default());
        let main = main.add(output);

        debug!(
            "Built MLP: {} + {} -> {} x{} -> {}",
            config.input_dim,
            config.time_dim,
            hidden,
            NUM_HIDDEN_BLOCKS + 1,
            config.input_dim
        );

        Ok(Self { main, config })
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Any tensor whose element count is a multiple of `input_dim`
    /// * `t` - Either one time row (broadcast to every input row) or one per input row
    ///
    /// # Returns
    /// Tensor with the shape of `x`
    pub fn forward_xt(&self, x: &Tensor, t: &Tensor) -> Result<Tensor> {
        let input_dim = self.config.input_dim;
        let time_dim = self.config.time_dim;

        let shape = x.size();
        let numel = x.numel() as i64;
        if numel % input_dim != 0 {
            return Err(Error::shape(
                "x",
                format!("a multiple of {} elements", input_dim),
                shape,
            ));
        }
        let rows = numel / input_dim;

        let t_numel = t.numel() as i64;
        if t_numel % time_dim != 0 || (t_numel != time_dim && t_numel != rows * time_dim) {
            return Err(Error::shape(
                "t",
                format!("{} or {} elements", time_dim, rows * time_dim),
                t.size(),
            ));
        }

        let x = x.to_kind(Kind::Float).reshape([rows, input_dim]);
        let t = t
            .to_kind(Kind::Float)
            .reshape([t_numel / time_dim, time_dim])
            .expand([rows, time_dim], false);

        let h = Tensor::cat(&[x, t], 1);
        Ok(self.main.forward(&h).reshape(shape.as_slice()))
    }
}

impl Backbone for Mlp {
    fn forward(&self, x: &Tensor, t: &Tensor, cond: Option<&Tensor>) -> Result<Tensor> {
        if cond.is_some() {
            return Err(Error::UnexpectedConditioning(BackboneKind::Mlp));
        }
        self.forward_xt(x, t)
    }

    fn kind(&self) -> BackboneKind {
        BackboneKind::Mlp
    }

    fn input_shape(&self) -> Vec<i64> {
        vec![self.config.input_dim]
    }
}
