//! Environments the training loop can drive.

mod test_env;

pub use test_env::EnvTest;

use crate::error::Result;
use crate::types::{Action, Observation, ObservationShape};

/// Result of a single environment step
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
}

/// A single-agent environment with image-like observations and a discrete
/// action space.
pub trait Environment {
    /// Shape of one (unstacked) frame
    fn observation_shape(&self) -> ObservationShape;

    /// Number of discrete actions
    fn num_actions(&self) -> usize;

    /// Start a new episode and return its first frame
    fn reset(&mut self) -> Observation;

    /// Apply `action`
    fn step(&mut self, action: Action) -> Result<StepResult>;
}
