//! # Diffusion Backbones
//!
//! Denoising networks for diffusion models over vectors and fixed-horizon
//! trajectories, built on `tch`.
//!
//! ## Backbones
//!
//! - `Mlp`: fully connected network over flattened inputs with the time signal appended
//! - `TemporalCnn`: 1-D convolutions along the horizon with a time channel
//! - `ConditionalTemporalCnn`: as above, plus broadcast conditioning channels
//! - `UNet`, `ControlNet`: declared, not implemented yet
//!
//! Every backbone returns a tensor with the shape of its input.
//!
//! ## Example
//!
//! ```rust,no_run
//! use diffusion_backbones::model::{Backbone, TemporalCnn, TemporalCnnConfig};
//! use tch::{nn, Device, Kind, Tensor};
//!
//! fn main() -> diffusion_backbones::Result<()> {
//!     let vs = nn::VarStore::new(Device::Cpu);
//!     let model = TemporalCnn::new(&vs.root(), TemporalCnnConfig::default())?;
//!
//!     let x = Tensor::randn([16, 32, 2], (Kind::Float, Device::Cpu));
//!     let t = Tensor::rand([16], (Kind::Float, Device::Cpu));
//!     let eps = model.forward(&x, &t, None)?;
//!     assert_eq!(eps.size(), x.size());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod model;
pub mod utils;

pub use error::{Error, Result};
pub use model::{Backbone, BackboneConfig, BackboneKind};
pub use utils::{Config, DeviceConfig};
