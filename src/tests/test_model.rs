use ndarray::{array, Array1, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::common::{pixel_batch, pixel_network, raw_config, unit_model};
use crate::batch::TransitionBatch;
use crate::config::DqnConfig;
use crate::error::DqnError;
use crate::model::DqnModel;
use crate::network::QNetwork;
use crate::params::{ParamRole, Parameterized};
use crate::types::ObservationShape;

#[test]
fn test_single_transition_loss() {
    let model = unit_model(&raw_config(0.9));
    let batch = pixel_batch(&[2], &[0], &[1.0], &[3], &[false]);

    let q = model.q_values(&batch.states).unwrap();
    assert_eq!(q, array![[2.0, 2.0]]);
    let target_q = model.target_q_values(&batch.next_states).unwrap();
    assert_eq!(target_q.view(), array![[3.0, 3.0]]);

    let out = model.loss(&batch).unwrap();
    assert!((out.targets[0] - 3.7).abs() < 1e-6);
    assert_eq!(out.predicted[0], 2.0);
    assert!((out.loss - 2.89).abs() < 1e-5);
}

#[test]
fn test_closed_form_gradients() {
    let model = unit_model(&raw_config(0.9));
    let batch = pixel_batch(&[2], &[0], &[1.0], &[3], &[false]);

    let step = model.gradients(&batch).unwrap();
    // dL/dQ(s, 0) = -2 * 1.7 = -3.4, times the input pixel 2
    assert!((step.gradients.weights[[0, 0]] + 6.8).abs() < 1e-5);
    assert_eq!(step.gradients.weights[[0, 1]], 0.0);
    assert!((step.gradients.biases[0] + 3.4).abs() < 1e-5);
    assert_eq!(step.gradients.biases[1], 0.0);
    assert!((step.grad_norm - 57.8f32.sqrt()).abs() < 1e-4);
}

#[test]
fn test_per_parameter_clipping_in_gradients() {
    let config = raw_config(0.9).grad_clip(Some(5.0));
    let model = unit_model(&config);
    let batch = pixel_batch(&[2], &[0], &[1.0], &[3], &[false]);

    let step = model.gradients(&batch).unwrap();
    // weight gradient (norm 6.8) is clipped on its own, bias (3.4) is not
    assert!((step.gradients.weights[[0, 0]] + 5.0).abs() < 1e-5);
    assert!((step.gradients.biases[0] + 3.4).abs() < 1e-5);
    assert!((step.grad_norm - 36.56f32.sqrt()).abs() < 1e-4);
}

#[test]
fn test_terminal_transitions_ignore_target_network() {
    let config = raw_config(0.99);
    let online = pixel_network(array![[0.5, -1.0]], array![0.1, 0.2]);
    let calm = DqnModel::from_networks(
        online.clone(),
        pixel_network(array![[0.0, 0.0]], array![0.0, 0.0]),
        &config,
    )
    .unwrap();
    let wild = DqnModel::from_networks(
        online,
        pixel_network(array![[1.0e6, -1.0e6]], array![1.0e5, 3.0]),
        &config,
    )
    .unwrap();

    let batch = pixel_batch(&[4, 7, 1], &[0, 1, 1], &[1.0, -2.0, 0.5], &[9, 200, 0], &[true, true, true]);
    let a = calm.loss(&batch).unwrap();
    let b = wild.loss(&batch).unwrap();
    assert_eq!(a.loss, b.loss);
    assert_eq!(a.targets, batch.rewards);
    assert_eq!(b.targets, batch.rewards);

    let ga = calm.gradients(&batch).unwrap();
    let gb = wild.gradients(&batch).unwrap();
    assert_eq!(ga.gradients, gb.gradients);
}

#[test]
fn test_nan_in_target_network_reaches_the_loss() {
    let config = raw_config(0.9);
    let online = pixel_network(array![[1.0, 1.0]], array![0.0, 0.0]);
    let target = pixel_network(array![[f32::NAN, 1.0]], array![0.0, 0.0]);
    let mut model = DqnModel::from_networks(online, target, &config).unwrap();
    let batch = pixel_batch(&[2], &[0], &[1.0], &[3], &[false]);

    let out = model.loss(&batch).unwrap();
    assert!(out.targets[0].is_nan());
    assert!(out.loss.is_nan());

    let step = model.update_step(&batch, 0.01).unwrap();
    assert!(step.loss.is_nan());
    assert!(step.grad_norm.is_nan());
}

#[test]
fn test_gradients_only_see_bootstrap_values() {
    let config = raw_config(0.9);
    let online = pixel_network(array![[0.3, 0.7]], array![0.0, 0.0]);
    // different parameters, same max over actions for s' = 3
    let first = DqnModel::from_networks(online.clone(), pixel_network(array![[1.0, 3.0]], array![0.0, 0.0]), &config).unwrap();
    let second = DqnModel::from_networks(online, pixel_network(array![[3.0, 1.0]], array![0.0, 0.0]), &config).unwrap();

    let batch = pixel_batch(&[2], &[1], &[0.0], &[3], &[false]);
    let g1 = first.gradients(&batch).unwrap();
    let g2 = second.gradients(&batch).unwrap();
    assert_eq!(g1.gradients, g2.gradients);

    // gradients cover the online parameters and nothing else
    assert_eq!(g1.gradients.weights.dim(), first.online().weights().dim());
    assert_eq!(g1.gradients.biases.dim(), first.online().biases().dim());
}

#[test]
fn test_update_step_never_touches_target() {
    let mut model = unit_model(&raw_config(0.9));
    let target_before = model.target().clone();
    let online_before = model.online().clone();
    let batch = pixel_batch(&[2, 5], &[0, 1], &[1.0, -1.0], &[3, 1], &[false, true]);

    let out = model.update_step(&batch, 0.01).unwrap();
    assert!(out.loss.is_finite());
    assert!(out.grad_norm > 0.0);
    assert_eq!(model.target(), &target_before);
    assert_ne!(model.online(), &online_before);
    assert_eq!(model.num_updates(), 1);
}

#[test]
fn test_repeated_updates_are_distinct_steps() {
    let mut model = unit_model(&raw_config(0.9));
    let batch = pixel_batch(&[2], &[0], &[1.0], &[3], &[false]);

    model.update_step(&batch, 0.1).unwrap();
    let after_one = model.online().weights()[[0, 0]];
    model.update_step(&batch, 0.1).unwrap();
    let after_two = model.online().weights()[[0, 0]];

    // the TD error is positive, so Q(s, 0) is pushed up each time
    assert!(after_one > 1.0);
    assert!(after_two > after_one);
    assert_eq!(model.num_updates(), 2);
}

#[test]
fn test_training_reduces_loss_on_fixed_batch() {
    let mut model = unit_model(&raw_config(0.5));
    let batch = pixel_batch(&[2, 4], &[0, 1], &[1.0, 0.0], &[3, 1], &[true, true]);

    let initial = model.loss(&batch).unwrap().loss;
    for _ in 0..200 {
        model.update_step(&batch, 0.01).unwrap();
    }
    let trained = model.loss(&batch).unwrap().loss;
    assert!(trained < initial * 0.1, "loss went from {} to {}", initial, trained);
}

#[test]
fn test_gradients_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(5);
    let shape = ObservationShape::new(2, 2, 1);
    let config = DqnConfig::default().gamma(0.9).high(10.0).grad_clip(None);
    let online = QNetwork::new(shape, 3, 10.0, config.weight_init, &mut rng).unwrap();
    let target = QNetwork::new(shape, 3, 10.0, config.weight_init, &mut rng).unwrap();

    let n = 5;
    let states = Array4::from_shape_fn((n, 2, 2, 1), |_| rng.gen_range(0..10u8));
    let next_states = Array4::from_shape_fn((n, 2, 2, 1), |_| rng.gen_range(0..10u8));
    let batch = TransitionBatch::new(
        states,
        (0..n).map(|i| i % 3).collect(),
        Array1::from_shape_fn(n, |i| i as f32 * 0.5 - 1.0),
        next_states,
        (0..n).map(|i| i == 2).collect(),
    );

    let model = DqnModel::from_networks(online.clone(), target.clone(), &config).unwrap();
    let analytic = model.gradients(&batch).unwrap().gradients;

    let loss_with = |weights: ndarray::Array2<f32>, biases: Array1<f32>| {
        let net = QNetwork::with_parameters(shape, 10.0, weights, biases).unwrap();
        DqnModel::from_networks(net, target.clone(), &config)
            .unwrap()
            .loss(&batch)
            .unwrap()
            .loss
    };

    let h = 1e-2;
    for ((i, j), &g) in analytic.weights.indexed_iter() {
        let mut plus = online.weights().clone();
        plus[[i, j]] += h;
        let mut minus = online.weights().clone();
        minus[[i, j]] -= h;
        let numeric = (loss_with(plus, online.biases().clone()) - loss_with(minus, online.biases().clone())) / (2.0 * h);
        assert!((numeric - g).abs() < 1e-2 * (1.0 + g.abs()), "weight ({}, {}): {} vs {}", i, j, numeric, g);
    }
    for (j, &g) in analytic.biases.indexed_iter() {
        let mut plus = online.biases().clone();
        plus[j] += h;
        let mut minus = online.biases().clone();
        minus[j] -= h;
        let numeric = (loss_with(online.weights().clone(), plus) - loss_with(online.weights().clone(), minus)) / (2.0 * h);
        assert!((numeric - g).abs() < 1e-2 * (1.0 + g.abs()), "bias {}: {} vs {}", j, numeric, g);
    }
}

#[test]
fn test_rejects_malformed_batches() {
    let mut model = unit_model(&raw_config(0.9));

    let wrong_shape = TransitionBatch::new(
        Array4::zeros((1, 2, 1, 1)),
        vec![0],
        array![0.0],
        Array4::zeros((1, 2, 1, 1)),
        vec![false],
    );
    assert!(matches!(model.loss(&wrong_shape), Err(DqnError::DimensionMismatch { .. })));

    let bad_action = pixel_batch(&[1], &[2], &[0.0], &[1], &[false]);
    assert!(matches!(model.update_step(&bad_action, 0.01), Err(DqnError::InvalidAction { .. })));

    let ok = pixel_batch(&[1], &[0], &[0.0], &[1], &[false]);
    assert!(model.update_step(&ok, 0.0).is_err());
    assert_eq!(model.num_updates(), 0);
}

#[test]
fn test_new_model_starts_synchronized() {
    let mut rng = StdRng::seed_from_u64(9);
    let config = DqnConfig::default();
    let shape = ObservationShape::new(3, 3, 1).stacked(config.state_history);
    let model = DqnModel::new(shape, 4, &config, &mut rng).unwrap();

    assert_eq!(model.num_syncs(), 1);
    for role in [ParamRole::Weight, ParamRole::Bias] {
        assert_eq!(model.online().parameter(role), model.target().parameter(role));
    }
    assert_eq!(model.online().weights().dim(), (36, 4));
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let mut rng = StdRng::seed_from_u64(9);
    let shape = ObservationShape::new(1, 1, 1);
    let config = DqnConfig::default().gamma(1.5);
    assert!(matches!(
        DqnModel::new(shape, 2, &config, &mut rng),
        Err(DqnError::InvalidParameter { .. })
    ));
}
