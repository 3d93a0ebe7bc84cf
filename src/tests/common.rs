use ndarray::{array, Array1, Array2, Array4};

use crate::batch::TransitionBatch;
use crate::config::DqnConfig;
use crate::model::DqnModel;
use crate::network::QNetwork;
use crate::types::ObservationShape;

/// Configuration with raw pixel features and no clipping
pub fn raw_config(gamma: f32) -> DqnConfig {
    DqnConfig::default().gamma(gamma).high(1.0).grad_clip(None)
}

/// Single-pixel network with two actions
pub fn pixel_network(weights: Array2<f32>, biases: Array1<f32>) -> QNetwork {
    QNetwork::with_parameters(ObservationShape::new(1, 1, 1), 1.0, weights, biases).unwrap()
}

/// Online and target both `W = [[1, 1]]`, `b = [0, 0]`
pub fn unit_model(config: &DqnConfig) -> DqnModel {
    let online = pixel_network(array![[1.0, 1.0]], array![0.0, 0.0]);
    let target = online.clone();
    DqnModel::from_networks(online, target, config).unwrap()
}

pub fn pixels(values: &[u8]) -> Array4<u8> {
    Array4::from_shape_vec((values.len(), 1, 1, 1), values.to_vec()).unwrap()
}

/// One-pixel transitions
pub fn pixel_batch(
    states: &[u8],
    actions: &[usize],
    rewards: &[f32],
    next_states: &[u8],
    done: &[bool],
) -> TransitionBatch {
    TransitionBatch::new(
        pixels(states),
        actions.to_vec(),
        Array1::from_vec(rewards.to_vec()),
        pixels(next_states),
        done.to_vec(),
    )
}
