use log::debug;
use ndarray::Array1;
use rand::Rng;

use crate::batch::TransitionBatch;
use crate::config::DqnConfig;
use crate::error::{DqnError, Result};
use crate::loss::{Detached, TdLoss, TdLossOutput};
use crate::network::{scale_for, QNetwork};
use crate::optimizer::{Adam, GradientClipper, Optimizer};
use crate::params::Gradients;
use crate::sync::TargetSync;
use crate::types::{Action, Observation, ObservationBatch, ObservationShape};

/// Diagnostics of one optimizer step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutput {
    pub loss: f32,
    /// Global norm of the gradients after clipping
    pub grad_norm: f32,
}

/// Loss and (clipped) gradients of the online network for one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct StepGradients {
    pub loss: TdLossOutput,
    pub gradients: Gradients,
    pub grad_norm: f32,
}

/// Online and target linear approximators wired to the TD loss, the Adam
/// optimizer and target synchronization.
///
/// # Example
///
/// ```
/// use deepq::config::DqnConfig;
/// use deepq::model::DqnModel;
/// use deepq::types::ObservationShape;
/// use rand::SeedableRng;
///
/// let config = DqnConfig::default();
/// let shape = ObservationShape::new(5, 5, 1).stacked(config.state_history);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let model = DqnModel::new(shape, 5, &config, &mut rng).unwrap();
/// assert_eq!(model.online().weights(), model.target().weights());
/// ```
#[derive(Clone, Debug)]
pub struct DqnModel {
    online: QNetwork,
    target: QNetwork,
    sync: TargetSync,
    loss: TdLoss,
    optimizer: Adam,
    clipper: GradientClipper,
    num_updates: usize,
    num_syncs: usize,
}

impl DqnModel {
    /// Build both approximators with independent random parameters, then
    /// synchronize the target with the online network.
    pub fn new<R: Rng + ?Sized>(
        shape: ObservationShape,
        num_actions: usize,
        config: &DqnConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let online = QNetwork::new(shape, num_actions, config.high, config.weight_init, rng)?;
        let target = QNetwork::new(shape, num_actions, config.high, config.weight_init, rng)?;
        let mut model = Self::from_networks(online, target, config)?;
        model.sync_target()?;
        Ok(model)
    }

    /// Wire up existing networks as they are, without synchronizing them.
    pub fn from_networks(online: QNetwork, target: QNetwork, config: &DqnConfig) -> Result<Self> {
        config.validate()?;
        if online.observation_shape() != target.observation_shape() {
            return Err(DqnError::dimension_mismatch(
                format!("target observation shape {}", online.observation_shape()),
                format!("target observation shape {}", target.observation_shape()),
            ));
        }
        let scale = scale_for(config.high)?;
        if online.scale() != scale || target.scale() != scale {
            return Err(DqnError::invalid_parameter(
                "high".to_string(),
                format!(
                    "networks must scale pixels by 1/{} like the configuration, got {} (online) and {} (target)",
                    config.high,
                    online.scale(),
                    target.scale()
                ),
            ));
        }
        let sync = TargetSync::new(&online, &target)?;
        Ok(DqnModel {
            online,
            target,
            sync,
            loss: TdLoss::new(config.gamma)?,
            optimizer: Adam::new(config.adam_beta1, config.adam_beta2, config.adam_epsilon)?,
            clipper: config.clipper(),
            num_updates: 0,
            num_syncs: 0,
        })
    }

    pub fn online(&self) -> &QNetwork {
        &self.online
    }

    pub fn target(&self) -> &QNetwork {
        &self.target
    }

    pub fn observation_shape(&self) -> ObservationShape {
        self.online.observation_shape()
    }

    pub fn num_actions(&self) -> usize {
        self.online.num_actions()
    }

    pub fn gamma(&self) -> f32 {
        self.loss.gamma
    }

    pub fn clipper(&self) -> GradientClipper {
        self.clipper
    }

    /// Number of optimizer steps taken
    pub fn num_updates(&self) -> usize {
        self.num_updates
    }

    /// Number of target synchronizations performed, including the one at
    /// construction
    pub fn num_syncs(&self) -> usize {
        self.num_syncs
    }

    /// Online action values, `(N, num_actions)`
    pub fn q_values(&self, states: &ObservationBatch) -> Result<ndarray::Array2<f32>> {
        self.online.q_values(states)
    }

    /// Target action values, detached from any gradient computation
    pub fn target_q_values(&self, states: &ObservationBatch) -> Result<Detached> {
        Ok(Detached::new(self.target.q_values(states)?))
    }

    /// Greedy action of the online network
    pub fn best_action(&self, observation: &Observation) -> Result<(Action, Array1<f32>)> {
        self.online.best_action(observation)
    }

    /// TD loss of the batch under the current parameters
    pub fn loss(&self, batch: &TransitionBatch) -> Result<TdLossOutput> {
        batch.validate(&self.observation_shape(), self.num_actions())?;
        let q = self.online.q_values(&batch.states)?;
        let target_q = self.target_q_values(&batch.next_states)?;
        self.loss
            .compute(q.view(), &target_q, &batch.actions, batch.rewards.view(), &batch.done)
    }

    /// Loss plus clipped gradients with respect to the online parameters.
    /// Nothing is modified.
    pub fn gradients(&self, batch: &TransitionBatch) -> Result<StepGradients> {
        batch.validate(&self.observation_shape(), self.num_actions())?;
        let features = self.online.features(&batch.states)?;
        let q = self.online.forward_features(features.view())?;
        let target_q = self.target_q_values(&batch.next_states)?;
        let loss = self
            .loss
            .compute(q.view(), &target_q, &batch.actions, batch.rewards.view(), &batch.done)?;

        let mut gradients = self.online.backward(features.view(), loss.q_grads.view())?;
        self.clipper.clip_gradients(&mut gradients);
        let grad_norm = GradientClipper::compute_global_norm(&gradients);

        Ok(StepGradients {
            loss,
            gradients,
            grad_norm,
        })
    }

    /// One Adam step on the online network. This is the only operation that
    /// changes online parameters.
    pub fn update_step(&mut self, batch: &TransitionBatch, learning_rate: f32) -> Result<StepOutput> {
        if !(learning_rate > 0.0) {
            return Err(DqnError::invalid_parameter(
                "learning_rate".to_string(),
                format!("must be positive, got {}", learning_rate),
            ));
        }
        let step = self.gradients(batch)?;
        self.optimizer.step(&mut self.online, &step.gradients, learning_rate)?;
        self.num_updates += 1;

        Ok(StepOutput {
            loss: step.loss.loss,
            grad_norm: step.grad_norm,
        })
    }

    /// Copy every online parameter into the target network.
    pub fn sync_target(&mut self) -> Result<()> {
        self.sync.sync(&self.online, &mut self.target)?;
        self.num_syncs += 1;
        debug!("Target network synchronized ({} syncs)", self.num_syncs);
        Ok(())
    }
}
