use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::{pixel_batch, pixel_network, raw_config};
use crate::error::DqnError;
use crate::layers::WeightInit;
use crate::model::DqnModel;
use crate::network::QNetwork;
use crate::params::{ParamRole, Parameterized};
use crate::sync::TargetSync;
use crate::types::ObservationShape;

fn same_parameters(a: &QNetwork, b: &QNetwork) -> bool {
    [ParamRole::Weight, ParamRole::Bias]
        .into_iter()
        .all(|role| a.parameter(role) == b.parameter(role))
}

#[test]
fn test_sync_copies_every_parameter() {
    let mut rng = StdRng::seed_from_u64(3);
    let shape = ObservationShape::new(2, 2, 2);
    let online = QNetwork::new(shape, 3, 1.0, WeightInit::XavierUniform, &mut rng).unwrap();
    let target = QNetwork::new(shape, 3, 1.0, WeightInit::Normal { mean: 0.0, std: 1.0 }, &mut rng).unwrap();

    let mut model = DqnModel::from_networks(online, target, &raw_config(0.9)).unwrap();
    assert_eq!(model.num_syncs(), 0);
    assert!(!same_parameters(model.online(), model.target()));

    model.sync_target().unwrap();
    assert!(same_parameters(model.online(), model.target()));
    assert_eq!(model.num_syncs(), 1);
}

#[test]
fn test_target_is_frozen_between_syncs() {
    let online = pixel_network(array![[1.0, 1.0]], array![0.0, 0.0]);
    let target = pixel_network(array![[0.5, 0.5]], array![1.0, 1.0]);
    let mut model = DqnModel::from_networks(online, target, &raw_config(0.9)).unwrap();
    let batch = pixel_batch(&[2, 1], &[0, 1], &[1.0, 0.0], &[3, 2], &[false, false]);

    let frozen = model.target().clone();
    for _ in 0..5 {
        model.update_step(&batch, 0.05).unwrap();
        assert_eq!(model.target(), &frozen);
    }

    model.sync_target().unwrap();
    assert_eq!(model.target(), model.online());

    let synced = model.target().clone();
    model.update_step(&batch, 0.05).unwrap();
    assert_eq!(model.target(), &synced);
    assert_ne!(model.online(), &synced);
}

#[test]
fn test_sync_changes_bootstrap_targets() {
    let online = pixel_network(array![[2.0, 0.0]], array![0.0, 0.0]);
    let target = pixel_network(array![[0.0, 0.0]], array![0.0, 0.0]);
    let mut model = DqnModel::from_networks(online, target, &raw_config(0.5)).unwrap();
    let batch = pixel_batch(&[1], &[0], &[1.0], &[3], &[false]);

    assert!((model.loss(&batch).unwrap().targets[0] - 1.0).abs() < 1e-6);
    model.sync_target().unwrap();
    // 1 + 0.5 * max(6, 0)
    assert!((model.loss(&batch).unwrap().targets[0] - 4.0).abs() < 1e-6);
}

#[test]
fn test_incompatible_networks_are_rejected() {
    let mut rng = StdRng::seed_from_u64(4);
    let shape = ObservationShape::new(1, 1, 1);
    let online = QNetwork::new(shape, 2, 1.0, WeightInit::Zeros, &mut rng).unwrap();
    let target = QNetwork::new(shape, 3, 1.0, WeightInit::Zeros, &mut rng).unwrap();

    assert!(matches!(
        DqnModel::from_networks(online, target, &raw_config(0.9)),
        Err(DqnError::ParameterMismatch { .. })
    ));
}

#[test]
fn test_networks_must_share_pixel_scale() {
    let shape = ObservationShape::new(1, 1, 1);
    let raw = QNetwork::with_parameters(shape, 1.0, array![[1.0, 1.0]], array![0.0, 0.0]).unwrap();
    let scaled = QNetwork::with_parameters(shape, 255.0, array![[1.0, 1.0]], array![0.0, 0.0]).unwrap();

    // weights and biases pair up, but synced networks would still disagree
    assert!(matches!(
        DqnModel::from_networks(raw.clone(), scaled.clone(), &raw_config(0.9)),
        Err(DqnError::InvalidParameter { .. })
    ));
    // both networks agree with each other but not with the configuration
    assert!(matches!(
        DqnModel::from_networks(scaled.clone(), scaled.clone(), &raw_config(0.9)),
        Err(DqnError::InvalidParameter { .. })
    ));

    let config = raw_config(0.9).high(255.0);
    let mut model = DqnModel::from_networks(scaled.clone(), scaled, &config).unwrap();
    model.sync_target().unwrap();
    assert_eq!(model.online(), model.target());
}

#[test]
fn test_failed_sync_leaves_target_untouched() {
    let small = pixel_network(array![[1.0, 1.0]], array![0.0, 0.0]);
    let sync = TargetSync::new(&small, &small.clone()).unwrap();
    assert_eq!(sync.pairs().len(), 2);

    let online = QNetwork::with_parameters(ObservationShape::new(2, 1, 1), 1.0, array![[1.0, 2.0], [3.0, 4.0]], array![5.0, 6.0]).unwrap();
    let mut target = QNetwork::with_parameters(ObservationShape::new(2, 1, 1), 1.0, array![[0.0, 0.0], [0.0, 0.0]], array![0.0, 0.0]).unwrap();
    let before = target.clone();

    assert!(matches!(
        sync.sync(&online, &mut target),
        Err(DqnError::ParameterMismatch { role: ParamRole::Weight, .. })
    ));
    assert_eq!(target, before);
}
