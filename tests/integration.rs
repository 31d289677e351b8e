//! Integration tests for the diffusion backbones

use diffusion_backbones::model::{
    parameter_count, BackboneConfig, BackboneKind, ConditionalTemporalCnnConfig, MlpConfig,
    TemporalCnnConfig,
};
use diffusion_backbones::{Config, Error};
use tch::{nn, Device, Kind, Tensor};

fn implemented_configs() -> Vec<BackboneConfig> {
    vec![
        BackboneConfig::Mlp(MlpConfig {
            input_dim: 12,
            time_dim: 1,
            hidden_dim: 32,
        }),
        BackboneConfig::TemporalCnn(TemporalCnnConfig {
            horizon: 6,
            transition_dim: 2,
            hidden_dim: 16,
            kernel_size: 5,
        }),
        BackboneConfig::ConditionalTemporalCnn(ConditionalTemporalCnnConfig {
            horizon: 6,
            transition_dim: 2,
            cond_dim: 3,
            hidden_dim: 16,
            kernel_size: 2,
        }),
    ]
}

#[test]
fn test_shape_preservation_for_every_backbone() {
    for config in implemented_configs() {
        let vs = nn::VarStore::new(Device::Cpu);
        let backbone = config.build(&vs.root()).unwrap();
        assert!(parameter_count(&vs) > 0);

        for batch_size in [0, 1, 3, 10] {
            let mut shape = vec![batch_size];
            shape.extend(backbone.input_shape());

            let x = Tensor::randn(shape.as_slice(), (Kind::Float, Device::Cpu));
            let t = Tensor::rand([batch_size], (Kind::Float, Device::Cpu));
            let cond = backbone
                .cond_dim()
                .map(|d| Tensor::randn([batch_size, d], (Kind::Float, Device::Cpu)));

            let out = backbone.forward(&x, &t, cond.as_ref()).unwrap();
            assert_eq!(out.size(), x.size(), "{} with batch {}", backbone.kind(), batch_size);
            assert_eq!(out.kind(), Kind::Float);
        }
    }
}

#[test]
fn test_mlp_and_temporal_share_trajectory_layout() {
    // (batch, horizon, transition_dim) trajectories fed to both families
    let x = Tensor::randn([4, 6, 2], (Kind::Float, Device::Cpu));
    let t = Tensor::from_slice(&[10i64, 20, 30, 40]);

    for config in &implemented_configs()[..2] {
        let vs = nn::VarStore::new(Device::Cpu);
        let backbone = config.build(&vs.root()).unwrap();
        let out = backbone.forward(&x, &t, None).unwrap();
        assert_eq!(out.size(), vec![4, 6, 2]);
    }
}

#[test]
fn test_gradients_reach_every_parameter() {
    let vs = nn::VarStore::new(Device::Cpu);
    let backbone = implemented_configs()[2].build(&vs.root()).unwrap();

    let x = Tensor::randn([3, 6, 2], (Kind::Float, Device::Cpu));
    let t = Tensor::rand([3], (Kind::Float, Device::Cpu));
    let c = Tensor::randn([3, 3], (Kind::Float, Device::Cpu));

    let loss = backbone
        .forward(&x, &t, Some(&c))
        .unwrap()
        .pow_tensor_scalar(2)
        .mean(Kind::Float);
    loss.backward();

    for (name, var) in vs.variables() {
        assert!(var.grad().defined(), "no gradient for {}", name);
    }
}

#[test]
fn test_config_file_to_backbone() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let backbone = BackboneConfig::default_for(BackboneKind::ConditionalTemporalCnn);
    let config = Config::with_backbone(backbone);
    config.to_file(file.path()).unwrap();

    let loaded = Config::from_file(file.path()).unwrap();
    let vs = nn::VarStore::new(loaded.device.to_device());
    let backbone = loaded.backbone.build(&vs.root()).unwrap();
    assert_eq!(backbone.kind(), BackboneKind::ConditionalTemporalCnn);
    assert_eq!(backbone.input_shape(), vec![32, 2]);
    assert_eq!(backbone.cond_dim(), Some(1));
}

#[test]
fn test_placeholders_fail_to_build() {
    for kind in [BackboneKind::UNet, BackboneKind::ControlNet] {
        let vs = nn::VarStore::new(Device::Cpu);
        let err = BackboneConfig::default_for(kind).build(&vs.root()).unwrap_err();
        assert!(matches!(err, Error::Unimplemented(k) if k == kind));
        assert_eq!(err.to_string(), format!("Backbone not implemented: {}", kind));
    }
}
