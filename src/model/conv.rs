//! 1-D convolution with "same" padding.
//!
//! libtorch pads `padding="same"` asymmetrically when the kernel size is even:
//! the extra zero goes on the right. `nn::ConvConfig` only takes a symmetric
//! padding, so the input is padded explicitly before an unpadded convolution.

use tch::{nn, nn::Module, Tensor};

/// Stride-1 `Conv1d` whose output length equals its input length.
#[derive(Debug)]
pub struct SameConv1d {
    conv: nn::Conv1D,
    pad_left: i64,
    pad_right: i64,
}

impl SameConv1d {
    pub fn new(vs: &nn::Path, in_channels: i64, out_channels: i64, kernel_size: i64) -> Self {
        let conv = nn::conv1d(
            vs,
            in_channels,
            out_channels,
            kernel_size,
            nn::ConvConfig {
                padding: 0,
                ..Default::default()
            },
        );

        let (pad_left, pad_right) = same_padding(kernel_size);
        Self {
            conv,
            pad_left,
            pad_right,
        }
    }
}

/// Zero padding `(left, right)` keeping the length of a stride-1 convolution.
pub fn same_padding(kernel_size: i64) -> (i64, i64) {
    let total = (kernel_size - 1).max(0);
    let left = total / 2;
    (left, total - left)
}

impl Module for SameConv1d {
    fn forward(&self, xs: &Tensor) -> Tensor {
        if self.pad_left == 0 && self.pad_right == 0 {
            return self.conv.forward(xs);
        }
        let padded = xs.constant_pad_nd([self.pad_left, self.pad_right]);
        self.conv.forward(&padded)
    }
}
