//! Temporal convolutional denoisers over fixed-horizon trajectories.
//!
//! Trajectories arrive as `(batch, horizon, transition_dim)` (or anything with
//! the same element count per sample) and are convolved along the horizon,
//! with the time signal and optional conditioning broadcast as extra channels.

use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, Kind, Tensor};
use tracing::debug;

use super::activation::Swish;
use super::backbone::{Backbone, BackboneKind};
use super::conv::SameConv1d;
use crate::error::{ensure_positive, Error, Result};

/// Configuration for a [`TemporalCnn`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemporalCnnConfig {
    /// Trajectory length
    pub horizon: i64,
    /// Features per trajectory step
    pub transition_dim: i64,
    /// Channels in the hidden convolutions
    pub hidden_dim: i64,
    /// Convolution kernel size
    pub kernel_size: i64,
}

impl Default for TemporalCnnConfig {
    fn default() -> Self {
        Self {
            horizon: 32,
            transition_dim: 2,
            hidden_dim: 128,
            kernel_size: 5,
        }
    }
}

/// Configuration for a [`ConditionalTemporalCnn`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionalTemporalCnnConfig {
    /// Trajectory length
    pub horizon: i64,
    /// Features per trajectory step
    pub transition_dim: i64,
    /// Width of the conditioning vector
    pub cond_dim: i64,
    /// Channels in the hidden convolutions
    pub hidden_dim: i64,
    /// Convolution kernel size
    pub kernel_size: i64,
}

impl Default for ConditionalTemporalCnnConfig {
    fn default() -> Self {
        Self {
            horizon: 32,
            transition_dim: 2,
            cond_dim: 1,
            hidden_dim: 128,
            kernel_size: 5,
        }
    }
}

/// Shared conv stack: in -> hidden -> hidden -> hidden -> transition_dim.
#[derive(Debug)]
struct TemporalStack {
    main: nn::Sequential,
    horizon: i64,
    transition_dim: i64,
}

impl TemporalStack {
    fn new(
        vs: &nn::Path,
        in_channels: i64,
        horizon: i64,
        transition_dim: i64,
        hidden_dim: i64,
        kernel_size: i64,
    ) -> Self {
        let main = nn::seq()
            .add(SameConv1d::new(&(vs / "conv_in"), in_channels, hidden_dim, kernel_size))
            .add(Swish)
            .add(SameConv1d::new(&(vs / "conv_1"), hidden_dim, hidden_dim, kernel_size))
            .add(Swish)
            .add(SameConv1d::new(&(vs / "conv_2"), hidden_dim, hidden_dim, kernel_size))
            .add(Swish)
            .add(SameConv1d::new(&(vs / "conv_out"), hidden_dim, transition_dim, kernel_size));

        debug!(
            "Built temporal stack: {} -> {} x3 -> {} channels, kernel {}, horizon {}",
            in_channels, hidden_dim, transition_dim, kernel_size, horizon
        );

        Self {
            main,
            horizon,
            transition_dim,
        }
    }

    /// Number of trajectories in `x`.
    fn batch_size(&self, x: &Tensor) -> Result<i64> {
        let per_sample = self.horizon * self.transition_dim;
        let numel = x.numel() as i64;
        if numel % per_sample != 0 {
            return Err(Error::shape(
                "x",
                format!(
                    "a multiple of horizon * transition_dim = {} elements",
                    per_sample
                ),
                x.size(),
            ));
        }
        Ok(numel / per_sample)
    }

    /// Time signal as one channel per trajectory: `(batch, 1, horizon)`.
    fn time_channel(&self, t: &Tensor, batch: i64) -> Result<Tensor> {
        let t_numel = t.numel() as i64;
        if t_numel != 1 && t_numel != batch {
            return Err(Error::shape("t", format!("1 or {} elements", batch), t.size()));
        }
        Ok(t.to_kind(Kind::Float)
            .reshape([t_numel, 1, 1])
            .expand([batch, 1, self.horizon], false))
    }

    /// Runs the stack on `x` with `extra` channels appended after the trajectory features.
    fn run(&self, x: &Tensor, batch: i64, extra: Vec<Tensor>) -> Tensor {
        let shape = x.size();
        let x = x
            .to_kind(Kind::Float)
            .reshape([batch, self.horizon, self.transition_dim])
            .permute([0, 2, 1]);

        let mut channels = Vec::with_capacity(extra.len() + 1);
        channels.push(x);
        channels.extend(extra);

        let h = Tensor::cat(channels.as_slice(), 1);
        self.main
            .forward(&h)
            .permute([0, 2, 1])
            .reshape(shape.as_slice())
    }
}

/// Temporal CNN denoiser
///
/// Input channels are the trajectory features plus one time channel.
#[derive(Debug)]
pub struct TemporalCnn {
    stack: TemporalStack,
    config: TemporalCnnConfig,
}

impl TemporalCnn {
    /// Create a new temporal CNN under `vs`
    pub fn new(vs: &nn::Path, config: TemporalCnnConfig) -> Result<Self> {
        ensure_positive(&[
            ("horizon", config.horizon),
            ("transition_dim", config.transition_dim),
            ("hidden_dim", config.hidden_dim),
            ("kernel_size", config.kernel_size),
        ])?;

        let stack = TemporalStack::new(
            vs,
            config.transition_dim + 1,
            config.horizon,
            config.transition_dim,
            config.hidden_dim,
            config.kernel_size,
        );
        Ok(Self { stack, config })
    }

    pub fn config(&self) -> &TemporalCnnConfig {
        &self.config
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Trajectories, `batch * horizon * transition_dim` elements
    /// * `t` - One timestep per trajectory, or a single one shared by all
    ///
    /// # Returns
    /// Tensor with the shape of `x`
    pub fn forward_xt(&self, x: &Tensor, t: &Tensor) -> Result<Tensor> {
        let batch = self.stack.batch_size(x)?;
        let t = self.stack.time_channel(t, batch)?;
        Ok(self.stack.run(x, batch, vec![t]))
    }
}

impl Backbone for TemporalCnn {
    fn forward(&self, x: &Tensor, t: &Tensor, cond: Option<&Tensor>) -> Result<Tensor> {
        if cond.is_some() {
            return Err(Error::UnexpectedConditioning(BackboneKind::TemporalCnn));
        }
        self.forward_xt(x, t)
    }

    fn kind(&self) -> BackboneKind {
        BackboneKind::TemporalCnn
    }

    fn input_shape(&self) -> Vec<i64> {
        vec![self.config.horizon, self.config.transition_dim]
    }
}

/// Temporal CNN denoiser with a conditioning vector
///
/// Input channels are the trajectory features, one time channel and
/// `cond_dim` conditioning channels, each constant along the horizon.
#[derive(Debug)]
pub struct ConditionalTemporalCnn {
    stack: TemporalStack,
    config: ConditionalTemporalCnnConfig,
}

impl ConditionalTemporalCnn {
    /// Create a new conditional temporal CNN under `vs`
    pub fn new(vs: &nn::Path, config: ConditionalTemporalCnnConfig) -> Result<Self> {
        ensure_positive(&[
            ("horizon", config.horizon),
            ("transition_dim", config.transition_dim),
            ("cond_dim", config.cond_dim),
            ("hidden_dim", config.hidden_dim),
            ("kernel_size", config.kernel_size),
        ])?;

        let stack = TemporalStack::new(
            vs,
            config.transition_dim + 1 + config.cond_dim,
            config.horizon,
            config.transition_dim,
            config.hidden_dim,
            config.kernel_size,
        );
        Ok(Self { stack, config })
    }

    pub fn config(&self) -> &ConditionalTemporalCnnConfig {
        &self.config
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Trajectories, `batch * horizon * transition_dim` elements
    /// * `t` - One timestep per trajectory, or a single one shared by all
    /// * `c` - `cond_dim` values per trajectory, or a single vector shared by all
    ///
    /// # Returns
    /// Tensor with the shape of `x`
    pub fn forward_xtc(&self, x: &Tensor, t: &Tensor, c: &Tensor) -> Result<Tensor> {
        let cond_dim = self.config.cond_dim;
        let batch = self.stack.batch_size(x)?;
        let t = self.stack.time_channel(t, batch)?;

        let c_numel = c.numel() as i64;
        if c_numel != cond_dim && c_numel != batch * cond_dim {
            return Err(Error::shape(
                "c",
                format!("{} or {} elements", cond_dim, batch * cond_dim),
                c.size(),
            ));
        }
        let c = c
            .to_kind(Kind::Float)
            .reshape([c_numel / cond_dim, cond_dim, 1])
            .expand([batch, cond_dim, self.config.horizon], false);

        Ok(self.stack.run(x, batch, vec![t, c]))
    }
}

impl Backbone for ConditionalTemporalCnn {
    fn forward(&self, x: &Tensor, t: &Tensor, cond: Option<&Tensor>) -> Result<Tensor> {
        let c = cond.ok_or(Error::MissingConditioning(BackboneKind::ConditionalTemporalCnn))?;
        self.forward_xtc(x, t, c)
    }

    fn kind(&self) -> BackboneKind {
        BackboneKind::ConditionalTemporalCnn
    }

    fn input_shape(&self) -> Vec<i64> {
        vec![self.config.horizon, self.config.transition_dim]
    }

    fn cond_dim(&self) -> Option<i64> {
        Some(self.config.cond_dim)
    }
}
