//! Backbones that are declared but have no layers yet.

use tch::{nn, Tensor};

use super::backbone::{Backbone, BackboneKind};
use crate::error::{Error, Result};

/// Temporal U-Net denoiser. Not implemented.
#[derive(Debug)]
pub struct UNet {
    _private: (),
}

impl UNet {
    pub fn new(_vs: &nn::Path) -> Result<Self> {
        // TODO: downsampling/upsampling residual conv blocks with skip connections
        Err(Error::Unimplemented(BackboneKind::UNet))
    }
}

/// ControlNet branch for conditional generation. Not implemented.
#[derive(Debug)]
pub struct ControlNet {
    _private: (),
}

impl ControlNet {
    pub fn new(_vs: &nn::Path) -> Result<Self> {
        Err(Error::Unimplemented(BackboneKind::ControlNet))
    }
}

macro_rules! unimplemented_backbone {
    ($ty:ident) => {
        impl Backbone for $ty {
            fn forward(&self, _x: &Tensor, _t: &Tensor, _cond: Option<&Tensor>) -> Result<Tensor> {
                Err(Error::Unimplemented(BackboneKind::$ty))
            }

            fn kind(&self) -> BackboneKind {
                BackboneKind::$ty
            }

            fn input_shape(&self) -> Vec<i64> {
                Vec::new()
            }
        }
    };
}

unimplemented_backbone!(UNet);
unimplemented_backbone!(ControlNet);
