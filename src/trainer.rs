//! The synchronous DQN training loop.
//!
//! Every environment step stores a frame, acts epsilon-greedily on the
//! stacked observation and records the outcome. After `learning_start`
//! steps an optimizer step runs every `learning_freq` steps, and the target
//! network is synchronized every `target_update_freq` steps.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DqnConfig;
use crate::env::Environment;
use crate::error::{DqnError, Result};
use crate::metrics::MetricsTracker;
use crate::model::DqnModel;
use crate::replay_buffer::ReplayBuffer;
use crate::schedule::{epsilon_greedy, LinearExploration, LinearSchedule};

/// What a finished training run reports.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    /// Environment steps taken
    pub steps: usize,
    /// Episodes started
    pub episodes: usize,
    /// Optimizer steps taken
    pub updates: usize,
    /// Mean reward of each evaluation, the final one last
    pub eval_scores: Vec<f32>,
    pub last_loss: Option<f32>,
    pub last_grad_norm: Option<f32>,
}

pub struct Trainer<R: Rng = StdRng> {
    config: DqnConfig,
    rng: R,
    tracker: MetricsTracker,
}

impl Trainer<StdRng> {
    /// A trainer whose exploration and sampling are seeded with `seed`.
    pub fn with_seed(config: DqnConfig, seed: u64) -> Result<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Trainer<R> {
    pub fn new(config: DqnConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Trainer {
            config,
            rng,
            tracker: MetricsTracker::default(),
        })
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    /// Exploration schedule described by the configuration
    pub fn exploration(&self, num_actions: usize) -> LinearExploration {
        LinearExploration::new(num_actions, self.config.eps_begin, self.config.eps_end, self.config.eps_nsteps)
    }

    /// Learning-rate schedule described by the configuration
    pub fn lr_schedule(&self) -> LinearSchedule {
        LinearSchedule::new(self.config.lr_begin, self.config.lr_end, self.config.lr_nsteps)
    }

    fn check_compatible<E: Environment>(&self, model: &DqnModel, env: &E) -> Result<()> {
        let expected = env.observation_shape().stacked(self.config.state_history);
        if model.observation_shape() != expected {
            return Err(DqnError::dimension_mismatch(
                format!("model observations of shape {}", expected),
                format!("model observations of shape {}", model.observation_shape()),
            ));
        }
        if model.num_actions() != env.num_actions() {
            return Err(DqnError::dimension_mismatch(
                format!("{} actions", env.num_actions()),
                format!("{} actions", model.num_actions()),
            ));
        }
        Ok(())
    }

    /// Train `model` on `env` for `nsteps_train` environment steps, then
    /// run a final evaluation.
    pub fn train<E: Environment>(
        &mut self,
        model: &mut DqnModel,
        env: &mut E,
        exploration: &mut LinearExploration,
        lr_schedule: &mut LinearSchedule,
    ) -> Result<TrainingSummary> {
        self.check_compatible(model, env)?;
        let config = self.config.clone();
        let mut replay_buffer = ReplayBuffer::new(config.buffer_size, config.state_history, env.observation_shape())?;

        let mut t = 0;
        let mut last_eval = 0;
        let mut episodes = 0;

        info!(
            "Training for {} steps ({} actions, observations {})",
            config.nsteps_train,
            model.num_actions(),
            model.observation_shape()
        );

        while t < config.nsteps_train {
            let mut state = env.reset();
            self.tracker.start_episode();
            episodes += 1;

            loop {
                t += 1;
                last_eval += 1;

                let idx = replay_buffer.store_frame(state)?;
                let q_input = replay_buffer.encode_recent_observation()?;
                let (best_action, q_values) = model.best_action(&q_input)?;
                let action = exploration.get_action(best_action, &mut self.rng);
                self.tracker.record_q_values(&q_values.to_vec());

                let step = env.step(action)?;
                replay_buffer.store_effect(idx, action, step.reward, step.done)?;
                state = step.observation;

                self.train_step(t, model, &replay_buffer, lr_schedule.value())?;

                if t > config.learning_start && t % config.log_freq == 0 && t % config.learning_freq == 0 {
                    exploration.update(t);
                    lr_schedule.update(t);
                    self.log_progress(t, exploration.epsilon(), lr_schedule.value());
                } else if t < config.learning_start && t % config.log_freq == 0 {
                    info!("Populating the memory {}/{}", t, config.learning_start);
                }

                self.tracker.step(step.reward);
                if step.done || t >= config.nsteps_train {
                    break;
                }
            }

            self.tracker.end_episode();

            if t > config.learning_start && last_eval > config.eval_freq {
                last_eval = 0;
                let score = self.evaluate(model, env, config.num_episodes_test)?;
                self.tracker.record_eval_score(score);
            }
        }

        info!("Training done after {} steps", t);
        let score = self.evaluate(model, env, config.num_episodes_test)?;
        self.tracker.record_eval_score(score);

        Ok(TrainingSummary {
            steps: t,
            episodes,
            updates: model.num_updates(),
            eval_scores: self.tracker.metrics().eval_scores.clone(),
            last_loss: self.tracker.last_loss(),
            last_grad_norm: self.tracker.last_grad_norm(),
        })
    }

    /// Optimizer step and target synchronization for step `t`, on their
    /// respective cadences.
    fn train_step(&mut self, t: usize, model: &mut DqnModel, replay_buffer: &ReplayBuffer, lr: f32) -> Result<()> {
        let config = &self.config;
        if t > config.learning_start && t % config.learning_freq == 0 && replay_buffer.can_sample(config.batch_size) {
            let batch = replay_buffer.sample(config.batch_size, &mut self.rng)?;
            let out = model.update_step(&batch, lr)?;
            self.tracker.record_update(out.loss, out.grad_norm);
        }

        if t % config.target_update_freq == 0 {
            model.sync_target()?;
        }
        Ok(())
    }

    fn log_progress(&self, t: usize, epsilon: f32, lr: f32) {
        let rewards = self.tracker.reward_stats();
        let max_q = self.tracker.max_q_stats();
        let q = self.tracker.q_stats();
        info!(
            "t={} loss={:.4} grad_norm={:.4} avg_r={:.2} max_r={:.2} std_r={:.2} avg_q={:.2} max_q={:.2} std_q={:.2} eps={:.3} lr={:.5} eval={:.2}",
            t,
            self.tracker.last_loss().unwrap_or(f32::NAN),
            self.tracker.last_grad_norm().unwrap_or(f32::NAN),
            rewards.mean,
            rewards.max,
            rewards.std,
            q.mean,
            max_q.max,
            q.std,
            epsilon,
            lr,
            self.tracker.last_eval_score().unwrap_or(f32::NAN),
        );
    }

    /// Mean total reward over `num_episodes` episodes, acting greedily
    /// except with probability `soft_epsilon`.
    pub fn evaluate<E: Environment>(&mut self, model: &DqnModel, env: &mut E, num_episodes: usize) -> Result<f32> {
        self.check_compatible(model, env)?;
        if num_episodes == 0 {
            return Err(DqnError::invalid_parameter(
                "num_episodes".to_string(),
                "must be positive".to_string(),
            ));
        }

        let history = self.config.state_history;
        let mut replay_buffer = ReplayBuffer::new(history + 1, history, env.observation_shape())?;
        let mut rewards = Vec::with_capacity(num_episodes);

        for _ in 0..num_episodes {
            let mut state = env.reset();
            let mut total_reward = 0.0;
            loop {
                let idx = replay_buffer.store_frame(state)?;
                let q_input = replay_buffer.encode_recent_observation()?;
                let (best_action, _) = model.best_action(&q_input)?;
                let action = epsilon_greedy(best_action, model.num_actions(), self.config.soft_epsilon, &mut self.rng);

                let step = env.step(action)?;
                replay_buffer.store_effect(idx, action, step.reward, step.done)?;
                state = step.observation;
                total_reward += step.reward;
                if step.done {
                    break;
                }
            }
            rewards.push(total_reward);
        }

        let stats = crate::metrics::Statistics::from_values(&rewards);
        info!("Average reward: {:04.2} +/- {:04.2}", stats.mean, stats.std / (num_episodes as f32).sqrt());
        Ok(stats.mean)
    }
}
