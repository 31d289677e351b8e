//! Common interface and configuration for every denoising backbone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tch::{nn, Tensor};
use tracing::info;

use super::mlp::{Mlp, MlpConfig};
use super::placeholder::{ControlNet, UNet};
use super::temporal::{
    ConditionalTemporalCnn, ConditionalTemporalCnnConfig, TemporalCnn, TemporalCnnConfig,
};
use crate::error::{Error, Result};

/// A denoising network: maps a noisy input, a time signal and optional
/// conditioning to a tensor with the shape of the input.
pub trait Backbone: fmt::Debug + Send {
    /// Forward pass. `cond` must be `Some` exactly when [`Backbone::cond_dim`] is.
    fn forward(&self, x: &Tensor, t: &Tensor, cond: Option<&Tensor>) -> Result<Tensor>;

    fn kind(&self) -> BackboneKind;

    /// Shape of a single sample, without the batch dimension
    fn input_shape(&self) -> Vec<i64>;

    /// Width of the conditioning vector, for conditional backbones
    fn cond_dim(&self) -> Option<i64> {
        None
    }
}

/// Backbone architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneKind {
    Mlp,
    TemporalCnn,
    ConditionalTemporalCnn,
    UNet,
    ControlNet,
}

impl BackboneKind {
    pub const ALL: [BackboneKind; 5] = [
        BackboneKind::Mlp,
        BackboneKind::TemporalCnn,
        BackboneKind::ConditionalTemporalCnn,
        BackboneKind::UNet,
        BackboneKind::ControlNet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackboneKind::Mlp => "mlp",
            BackboneKind::TemporalCnn => "temporal-cnn",
            BackboneKind::ConditionalTemporalCnn => "conditional-temporal-cnn",
            BackboneKind::UNet => "unet",
            BackboneKind::ControlNet => "controlnet",
        }
    }
}

impl fmt::Display for BackboneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackboneKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        BackboneKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown backbone kind: {}", s)))
    }
}

/// Hyperparameters of a backbone, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BackboneConfig {
    #[serde(rename = "mlp")]
    Mlp(MlpConfig),
    #[serde(rename = "temporal-cnn")]
    TemporalCnn(TemporalCnnConfig),
    #[serde(rename = "conditional-temporal-cnn")]
    ConditionalTemporalCnn(ConditionalTemporalCnnConfig),
    #[serde(rename = "unet")]
    UNet,
    #[serde(rename = "controlnet")]
    ControlNet,
}

impl Default for BackboneConfig {
    fn default() -> Self {
        BackboneConfig::TemporalCnn(TemporalCnnConfig::default())
    }
}

impl BackboneConfig {
    /// Default hyperparameters for `kind`
    pub fn default_for(kind: BackboneKind) -> Self {
        match kind {
            BackboneKind::Mlp => BackboneConfig::Mlp(MlpConfig::default()),
            BackboneKind::TemporalCnn => BackboneConfig::TemporalCnn(TemporalCnnConfig::default()),
            BackboneKind::ConditionalTemporalCnn => {
                BackboneConfig::ConditionalTemporalCnn(ConditionalTemporalCnnConfig::default())
            }
            BackboneKind::UNet => BackboneConfig::UNet,
            BackboneKind::ControlNet => BackboneConfig::ControlNet,
        }
    }

    pub fn kind(&self) -> BackboneKind {
        match self {
            BackboneConfig::Mlp(_) => BackboneKind::Mlp,
            BackboneConfig::TemporalCnn(_) => BackboneKind::TemporalCnn,
            BackboneConfig::ConditionalTemporalCnn(_) => BackboneKind::ConditionalTemporalCnn,
            BackboneConfig::UNet => BackboneKind::UNet,
            BackboneConfig::ControlNet => BackboneKind::ControlNet,
        }
    }

    /// Build the backbone, registering its parameters under `vs`
    pub fn build(&self, vs: &nn::Path) -> Result<Box<dyn Backbone>> {
        let backbone: Box<dyn Backbone> = match self {
            BackboneConfig::Mlp(config) => Box::new(Mlp::new(vs, config.clone())?),
            BackboneConfig::TemporalCnn(config) => Box::new(TemporalCnn::new(vs, config.clone())?),
            BackboneConfig::ConditionalTemporalCnn(config) => {
                Box::new(ConditionalTemporalCnn::new(vs, config.clone())?)
            }
            BackboneConfig::UNet => Box::new(UNet::new(vs)?),
            BackboneConfig::ControlNet => Box::new(ControlNet::new(vs)?),
        };

        info!("Built {} backbone", backbone.kind());
        Ok(backbone)
    }
}

/// Total number of trainable elements in `vs`
pub fn parameter_count(vs: &nn::VarStore) -> i64 {
    vs.trainable_variables()
        .iter()
        .map(|var| var.numel() as i64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_kind_names() {
        for kind in BackboneKind::ALL {
            assert_eq!(kind.to_string().parse::<BackboneKind>().unwrap(), kind);
        }
        assert_eq!("Temporal_CNN".parse::<BackboneKind>().unwrap(), BackboneKind::TemporalCnn);
        assert!("transformer".parse::<BackboneKind>().is_err());
    }

    #[test]
    fn test_config_kind() {
        for kind in BackboneKind::ALL {
            assert_eq!(BackboneConfig::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_config_json_tags() {
        let config = BackboneConfig::Mlp(MlpConfig {
            input_dim: 4,
            time_dim: 1,
            hidden_dim: 32,
        });
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"mlp\""));

        // Missing fields fall back to defaults
        let parsed: BackboneConfig =
            serde_json::from_str(r#"{"kind": "temporal-cnn", "horizon": 64}"#).unwrap();
        match parsed {
            BackboneConfig::TemporalCnn(config) => {
                assert_eq!(config.horizon, 64);
                assert_eq!(config.kernel_size, 5);
            }
            other => panic!("unexpected config: {:?}", other),
        }

        let parsed: BackboneConfig = serde_json::from_str(r#"{"kind": "unet"}"#).unwrap();
        assert_eq!(parsed, BackboneConfig::UNet);
    }

    #[test]
    fn test_mlp_parameter_count() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = BackboneConfig::Mlp(MlpConfig {
            input_dim: 4,
            time_dim: 1,
            hidden_dim: 16,
        });
        config.build(&vs.root()).unwrap();

        let (d, h) = (4, 16);
        let expected = (d + 1) * h + h + 3 * (h * h + h) + h * d + d;
        assert_eq!(parameter_count(&vs), expected);
    }

    #[test]
    fn test_temporal_parameter_count() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = BackboneConfig::ConditionalTemporalCnn(ConditionalTemporalCnnConfig {
            horizon: 8,
            transition_dim: 3,
            cond_dim: 2,
            hidden_dim: 10,
            kernel_size: 3,
        });
        config.build(&vs.root()).unwrap();

        let conv = |cin: i64, cout: i64| cout * cin * 3 + cout;
        let expected = conv(3 + 1 + 2, 10) + 2 * conv(10, 10) + conv(10, 3);
        assert_eq!(parameter_count(&vs), expected);
    }

    #[test]
    fn test_build_placeholders() {
        let vs = nn::VarStore::new(Device::Cpu);
        for config in [BackboneConfig::UNet, BackboneConfig::ControlNet] {
            let err = config.build(&vs.root()).unwrap_err();
            assert!(matches!(err, Error::Unimplemented(kind) if kind == config.kind()));
        }
    }

    #[test]
    fn test_build_and_run() {
        let vs = nn::VarStore::new(Device::Cpu);
        let backbone = BackboneConfig::default().build(&vs.root()).unwrap();
        assert_eq!(backbone.kind(), BackboneKind::TemporalCnn);
        assert_eq!(backbone.input_shape(), vec![32, 2]);
        assert_eq!(backbone.cond_dim(), None);

        let x = Tensor::randn([2, 32, 2], (Kind::Float, Device::Cpu));
        let t = Tensor::rand([2], (Kind::Float, Device::Cpu));
        assert_eq!(backbone.forward(&x, &t, None).unwrap().size(), vec![2, 32, 2]);
    }
}
