//! Denoising backbones.

mod activation;
mod backbone;
mod conv;
mod mlp;
mod placeholder;
mod temporal;

pub use activation::{swish, Swish};
pub use backbone::{parameter_count, Backbone, BackboneConfig, BackboneKind};
pub use conv::{same_padding, SameConv1d};
pub use mlp::{Mlp, MlpConfig};
pub use placeholder::{ControlNet, UNet};
pub use temporal::{
    ConditionalTemporalCnn, ConditionalTemporalCnnConfig, TemporalCnn, TemporalCnnConfig,
};
